//! # Block Module
//!
//! This module provides the voxel value type, its materials, and the six face
//! directions used when meshing.

use block_type::Material;

pub mod block_side;
pub mod block_type;

/// The integer type used to identify materials in vertex data.
pub type MaterialId = u32;

/// Represents a single voxel in a chunk.
///
/// This is a plain value type owned by the chunk that contains it; it has no
/// identity beyond its grid position. When `active` is false the material is
/// ignored and the voxel reads as air.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Voxel {
    /// What the voxel is made of. Only meaningful while `active` is set.
    pub material: Material,
    /// Whether the voxel occupies space.
    pub active: bool,
}

impl Voxel {
    /// The inactive voxel every chunk starts out filled with.
    pub const AIR: Voxel = Voxel {
        material: Material::Air,
        active: false,
    };

    /// Creates an active voxel of the given material.
    ///
    /// # Arguments
    /// * `material` - The material of the voxel
    ///
    /// # Returns
    /// A new active `Voxel`.
    pub fn solid(material: Material) -> Self {
        Voxel {
            material,
            active: true,
        }
    }

    /// Whether this voxel occupies space.
    pub fn is_solid(&self) -> bool {
        self.active
    }

    /// The material this voxel renders as, `Air` when inactive.
    pub fn effective_material(&self) -> Material {
        if self.active {
            self.material
        } else {
            Material::Air
        }
    }
}
