//! # Block Type Module
//!
//! This module defines the materials a voxel can be made of and the stable
//! numeric ids the renderer receives for them.

use std::fmt;

use num_derive::FromPrimitive;

use super::MaterialId;

/// Enumerates all materials in the voxel world.
///
/// The discriminant of each variant is its material id, which is written into
/// every vertex of the quads the variant produces. The `FromPrimitive` derive
/// provides the reverse conversion.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u32)]
pub enum Material {
    /// Empty space. An inactive voxel always reads as air.
    #[default]
    Air = 0,

    /// Sea-level floor.
    Water = 1,

    /// The default surface material, and the only one trees grow on.
    Grass = 2,

    /// Mountain tops.
    Snow = 3,

    /// Exposed rock bands in the upper part of the grass band.
    Stone = 4,

    /// Tree trunks.
    Wood = 5,

    /// Tree canopies.
    Leaves = 6,
}

impl Material {
    /// Every material in id order.
    pub const ALL: [Material; 7] = [
        Material::Air,
        Material::Water,
        Material::Grass,
        Material::Snow,
        Material::Stone,
        Material::Wood,
        Material::Leaves,
    ];

    /// Returns the id written into vertex data for this material.
    pub fn id(self) -> MaterialId {
        self as MaterialId
    }

    /// Converts a material id back into a `Material`.
    ///
    /// # Arguments
    /// * `id` - The id as stored in a vertex
    ///
    /// # Returns
    /// The matching material, or `None` if the id is unknown.
    pub fn from_id(id: MaterialId) -> Option<Self> {
        num_traits::FromPrimitive::from_u32(id)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
