use crate::{BlockPos, Location};

/// The six faces of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Downward (-Y direction)
    Down,
    /// Upward (+Y direction)
    Up,
    /// North (-Z direction)
    North,
    /// South (+Z direction)
    South,
    /// West (-X direction)
    West,
    /// East (+X direction)
    East,
}

impl Direction {
    /// All six directions in array form for iteration.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The faces a burning block can hold other blocks on.
    ///
    /// Blocks hanging below a block are not attached to it, so `Down` is left out.
    pub const CARDINALS: [Direction; 5] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Up,
    ];

    /// Gets the offset in the given direction.
    ///
    /// Returns (dx, dy, dz) for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }

    /// Returns the position next to `pos` in this direction.
    ///
    /// `None` when that face lies past the edge of the coordinate space.
    #[must_use]
    pub const fn relative(self, pos: BlockPos) -> Option<BlockPos> {
        let (dx, dy, dz) = self.offset();
        pos.checked_offset(dx, dy, dz)
    }

    /// Returns the location next to `loc` in this direction, in the same world.
    #[must_use]
    pub fn relative_location(self, loc: &Location) -> Option<Location> {
        self.relative(loc.pos)
            .map(|pos| Location::new(loc.world.clone(), pos))
    }
}
