//! Spatial index of active fire sites.
//!
//! Maps world sections to the pending burnt blocks inside them, so the
//! "is anything next to this block burning" question only touches the one or
//! two sections around the asked position.

use ember_utils::{BlockPos, Direction, Location, SectionPos, WorldId};
use rustc_hash::FxHashMap;

/// Pending blocks inside one 16x16x16 section, position to queue slot.
type Section = FxHashMap<BlockPos, u64>;

/// A sparse, bucketed index of pending burnt block locations.
///
/// Only sections that hold (or held) a pending block are allocated. Removing
/// the last block of a section leaves the empty bucket behind for
/// [`FireIndex::compact`] to reclaim.
///
/// Entries store the slot of the owning record in the restore queue, never
/// the record itself.
pub struct FireIndex {
    /// World to section to block entries.
    worlds: FxHashMap<WorldId, FxHashMap<SectionPos, Section>>,
    /// Number of registered locations.
    len: usize,
}

impl FireIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            worlds: FxHashMap::default(),
            len: 0,
        }
    }

    /// Registers `location` as an active fire site owned by queue `slot`.
    pub fn add(&mut self, location: &Location, slot: u64) {
        let section = self
            .worlds
            .entry(location.world.clone())
            .or_default()
            .entry(location.pos.section())
            .or_default();

        if section.insert(location.pos, slot).is_none() {
            self.len += 1;
        }
    }

    /// Deregisters `location` if it is still owned by queue `slot`.
    ///
    /// Removing a location that is not registered, or that another slot owns
    /// now, leaves the index unchanged. Returns true if an entry was removed.
    pub fn remove(&mut self, location: &Location, slot: u64) -> bool {
        let Some(section) = self
            .worlds
            .get_mut(&location.world)
            .and_then(|sections| sections.get_mut(&location.pos.section()))
        else {
            log::debug!("Fire index has no entry at {location}");
            return false;
        };

        match section.get(&location.pos) {
            Some(&owner) if owner == slot => {
                section.remove(&location.pos);
                self.len -= 1;
                true
            }
            Some(&owner) => {
                log::debug!("Fire index entry at {location} belongs to slot {owner}, not {slot}");
                false
            }
            None => {
                log::debug!("Fire index has no entry at {location}");
                false
            }
        }
    }

    /// Checks if `location` is registered.
    #[must_use]
    pub fn contains(&self, location: &Location) -> bool {
        self.slot_of(location).is_some()
    }

    /// The queue slot registered at `location`.
    #[must_use]
    pub fn slot_of(&self, location: &Location) -> Option<u64> {
        self.worlds
            .get(&location.world)
            .and_then(|sections| Self::lookup(sections, location.pos))
    }

    /// Returns true if `location` or one of its six face neighbours is registered.
    #[must_use]
    pub fn has_neighbor(&self, location: &Location) -> bool {
        let Some(sections) = self.worlds.get(&location.world) else {
            return false;
        };

        Self::lookup(sections, location.pos).is_some()
            || Direction::ALL
                .iter()
                .filter_map(|dir| dir.relative(location.pos))
                .any(|pos| Self::lookup(sections, pos).is_some())
    }

    /// Drops empty section buckets and empty worlds, and trims spare capacity.
    ///
    /// Membership is unchanged. Returns the number of buckets reclaimed.
    pub fn compact(&mut self) -> usize {
        let mut reclaimed = 0;

        self.worlds.retain(|_, sections| {
            let before = sections.len();
            sections.retain(|_, section| !section.is_empty());
            reclaimed += before - sections.len();

            for section in sections.values_mut() {
                section.shrink_to_fit();
            }
            sections.shrink_to_fit();
            !sections.is_empty()
        });
        self.worlds.shrink_to_fit();

        reclaimed
    }

    /// Iterates over every registered location.
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.worlds.iter().flat_map(|(world, sections)| {
            sections
                .values()
                .flat_map(move |section| section.keys().map(move |pos| Location::new(world.clone(), *pos)))
        })
    }

    /// Returns the number of allocated section buckets, empty ones included.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.worlds.values().map(FxHashMap::len).sum()
    }

    /// Returns the number of registered locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no location is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn lookup(sections: &FxHashMap<SectionPos, Section>, pos: BlockPos) -> Option<u64> {
        sections
            .get(&pos.section())
            .and_then(|section| section.get(&pos))
            .copied()
    }
}

impl Default for FireIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(x: i32, y: i32, z: i32) -> Location {
        Location::new(WorldId::new("world"), BlockPos::new(x, y, z))
    }

    #[test]
    fn test_add_and_remove() {
        let mut index = FireIndex::new();
        index.add(&loc(0, 64, 0), 7);

        assert_eq!(index.len(), 1);
        assert_eq!(index.slot_of(&loc(0, 64, 0)), Some(7));

        assert!(index.remove(&loc(0, 64, 0), 7));
        assert!(index.is_empty());
        assert!(!index.contains(&loc(0, 64, 0)));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut index = FireIndex::new();
        index.add(&loc(0, 64, 0), 1);

        assert!(!index.remove(&loc(1, 64, 0), 1));
        assert!(index.remove(&loc(0, 64, 0), 1));
        assert!(!index.remove(&loc(0, 64, 0), 1));
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_with_other_slot_keeps_entry() {
        let mut index = FireIndex::new();
        index.add(&loc(0, 64, 0), 3);

        assert!(!index.remove(&loc(0, 64, 0), 2));
        assert_eq!(index.slot_of(&loc(0, 64, 0)), Some(3));
        assert_eq!(index.len(), 1);

        assert!(index.remove(&loc(0, 64, 0), 3));
        assert!(index.is_empty());
    }

    #[test]
    fn test_has_neighbor_at_coordinate_edge() {
        let mut index = FireIndex::new();
        index.add(&loc(i32::MIN, 64, 0), 0);

        assert!(!index.has_neighbor(&loc(i32::MAX, 64, 0)));
        assert!(index.has_neighbor(&loc(i32::MIN + 1, 64, 0)));
        assert!(!index.has_neighbor(&loc(0, i32::MAX, i32::MIN)));
    }

    #[test]
    fn test_has_neighbor_faces_only() {
        let mut index = FireIndex::new();
        index.add(&loc(0, 64, 0), 0);

        assert!(index.has_neighbor(&loc(0, 64, 0)));
        for (x, y, z) in [(1, 64, 0), (-1, 64, 0), (0, 65, 0), (0, 63, 0), (0, 64, 1), (0, 64, -1)] {
            assert!(index.has_neighbor(&loc(x, y, z)), "({x}, {y}, {z})");
        }

        // Edges, corners and two blocks away are not face neighbours.
        for (x, y, z) in [(1, 65, 0), (1, 64, 1), (1, 65, 1), (2, 64, 0), (0, 66, 0)] {
            assert!(!index.has_neighbor(&loc(x, y, z)), "({x}, {y}, {z})");
        }
    }

    #[test]
    fn test_has_neighbor_across_section_boundary() {
        let mut index = FireIndex::new();
        // (15, 63, -1) and (16, 63, -1) live in different sections,
        // as do (0, 64, 0) and (0, 64, -1).
        index.add(&loc(15, 63, -1), 0);
        index.add(&loc(0, 64, 0), 1);

        assert!(index.has_neighbor(&loc(16, 63, -1)));
        assert!(index.has_neighbor(&loc(15, 64, -1)));
        assert!(index.has_neighbor(&loc(0, 64, -1)));
        assert!(index.has_neighbor(&loc(0, 63, 0)));
    }

    #[test]
    fn test_has_neighbor_is_per_world() {
        let mut index = FireIndex::new();
        index.add(&loc(0, 64, 0), 0);

        let nether = Location::new(WorldId::new("world_nether"), BlockPos::new(0, 64, 0));
        assert!(!index.has_neighbor(&nether));
    }

    #[test]
    fn test_compact_reclaims_empty_buckets_only() {
        let mut index = FireIndex::new();
        index.add(&loc(0, 64, 0), 0);
        index.add(&loc(100, 64, 100), 1);
        index.add(&loc(-100, 0, 5), 2);
        assert_eq!(index.bucket_count(), 3);

        assert!(index.remove(&loc(100, 64, 100), 1));
        assert!(index.remove(&loc(-100, 0, 5), 2));
        assert_eq!(index.bucket_count(), 3);

        assert_eq!(index.compact(), 2);
        assert_eq!(index.bucket_count(), 1);
        assert_eq!(index.len(), 1);
        assert!(index.contains(&loc(0, 64, 0)));

        // Compacting again changes nothing.
        assert_eq!(index.compact(), 0);
        assert_eq!(index.bucket_count(), 1);
        assert!(index.has_neighbor(&loc(0, 65, 0)));
    }

    #[test]
    fn test_locations_lists_every_entry() {
        let mut index = FireIndex::new();
        index.add(&loc(0, 64, 0), 0);
        index.add(&loc(40, 64, 0), 1);
        index.add(&loc(40, 64, 0), 1);

        let mut positions: Vec<BlockPos> = index.locations().map(|l| l.pos).collect();
        positions.sort_by_key(|p| p.0.x);
        assert_eq!(positions, vec![BlockPos::new(0, 64, 0), BlockPos::new(40, 64, 0)]);
        assert_eq!(index.len(), 2);
    }
}
