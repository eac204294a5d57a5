//! # Block Side Module
//!
//! This module defines the six axis-aligned face directions of a voxel and the
//! sweep parameters the greedy mesher derives from each of them.

use cgmath::{InnerSpace, Vector3};

/// Index of the X axis in a `[x, y, z]` triple.
pub const AXIS_X: usize = 0;
/// Index of the Y axis in a `[x, y, z]` triple.
pub const AXIS_Y: usize = 1;
/// Index of the Z axis in a `[x, y, z]` triple.
pub const AXIS_Z: usize = 2;

/// Represents the six possible faces of a voxel block.
///
/// Each direction carries the parameters of one meshing sweep:
/// the axis the face points along, the in-plane `U` and `V` axes, and whether
/// the face sits on the positive or negative side of the voxel.
///
/// The order of [`FaceDirection::all`] is the order faces are meshed in.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum FaceDirection {
    /// Facing negative X
    NegX = 0,
    /// Facing positive X
    PosX = 1,
    /// Facing positive Y (the top of a voxel)
    PosY = 2,
    /// Facing negative Y (the bottom of a voxel)
    NegY = 3,
    /// Facing negative Z
    NegZ = 4,
    /// Facing positive Z
    PosZ = 5,
}

impl FaceDirection {
    /// Returns all six directions in meshing order.
    pub fn all() -> [FaceDirection; 6] {
        [
            FaceDirection::NegX,
            FaceDirection::PosX,
            FaceDirection::PosY,
            FaceDirection::NegY,
            FaceDirection::NegZ,
            FaceDirection::PosZ,
        ]
    }

    /// The axis this face points along.
    pub fn normal_axis(self) -> usize {
        match self {
            FaceDirection::NegX | FaceDirection::PosX => AXIS_X,
            FaceDirection::PosY | FaceDirection::NegY => AXIS_Y,
            FaceDirection::NegZ | FaceDirection::PosZ => AXIS_Z,
        }
    }

    /// The in-plane axis quads grow along second.
    pub fn u_axis(self) -> usize {
        match self {
            FaceDirection::NegX | FaceDirection::PosX => AXIS_Z,
            _ => AXIS_X,
        }
    }

    /// The in-plane axis quads grow along first.
    pub fn v_axis(self) -> usize {
        match self {
            FaceDirection::PosY | FaceDirection::NegY => AXIS_Z,
            _ => AXIS_Y,
        }
    }

    /// `1` for faces on the positive side of a voxel, `-1` otherwise.
    pub fn sign(self) -> i64 {
        match self {
            FaceDirection::PosX | FaceDirection::PosY | FaceDirection::PosZ => 1,
            FaceDirection::NegX | FaceDirection::NegY | FaceDirection::NegZ => -1,
        }
    }

    /// The outward unit normal of the face.
    pub fn normal(self) -> Vector3<f32> {
        unit(self.normal_axis()) * self.sign() as f32
    }

    /// Unit vector along the `U` axis.
    pub fn axis_u(self) -> Vector3<f32> {
        unit(self.u_axis())
    }

    /// Unit vector along the `V` axis.
    pub fn axis_v(self) -> Vector3<f32> {
        unit(self.v_axis())
    }

    /// Whether the triangle order `origin, +U, +U+V` winds clockwise when seen
    /// from outside the face, i.e. `U × V` points against the normal.
    pub fn flips_winding(self) -> bool {
        self.axis_u().cross(self.axis_v()).dot(self.normal()) < 0.0
    }
}

fn unit(axis: usize) -> Vector3<f32> {
    let mut v = Vector3::new(0.0, 0.0, 0.0);
    v[axis] = 1.0;
    v
}
