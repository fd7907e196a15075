// Wrapper types making it harder to accidentaly use the wrong underlying type.

use std::{
    borrow::Borrow,
    fmt::{self, Display},
    sync::Arc,
};

use serde::{Deserialize, Deserializer};

use crate::math::Vector3;

/// A block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos(pub Vector3<i32>);

impl BlockPos {
    /// Creates a block position from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// Returns the position shifted by the given amounts, wrapping at the `i32` edge.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(
            self.0.x.wrapping_add(dx),
            self.0.y.wrapping_add(dy),
            self.0.z.wrapping_add(dz),
        )
    }

    /// Returns the position shifted by the given amounts, or `None` past the `i32` edge.
    #[must_use]
    pub const fn checked_offset(self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        match (
            self.0.x.checked_add(dx),
            self.0.y.checked_add(dy),
            self.0.z.checked_add(dz),
        ) {
            (Some(x), Some(y), Some(z)) => Some(Self::new(x, y, z)),
            _ => None,
        }
    }

    /// Returns the 16x16x16 section containing this position.
    #[must_use]
    pub const fn section(self) -> SectionPos {
        SectionPos(Vector3::new(self.0.x >> 4, self.0.y >> 4, self.0.z >> 4))
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.0.x, self.0.y, self.0.z)
    }
}

/// A cubic section position, in units of 16 blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionPos(pub Vector3<i32>);

/// Identifies a loaded world by name.
///
/// Cheap to clone, records and index entries all carry one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(Arc<str>);

impl WorldId {
    /// Creates a world identifier from its name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// The world name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Borrow<str> for WorldId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for WorldId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self(Arc::from(name)))
    }
}

/// A block position inside a specific world.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// The world the block lives in.
    pub world: WorldId,
    /// The block position.
    pub pos: BlockPos,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub const fn new(world: WorldId, pos: BlockPos) -> Self {
        Self { world, pos }
    }

    /// Returns the location next to this one, shifted by the given amounts.
    #[must_use]
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.world.clone(), self.pos.offset(dx, dy, dz))
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.world, self.pos)
    }
}
