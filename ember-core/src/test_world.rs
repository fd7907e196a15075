//! In-memory `BlockWorld` for unit tests.

use std::sync::Arc;

use ember_utils::{Direction, Location};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::world::{BlockWorld, CapturedBlock, RestoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBlock {
    pub id: &'static str,
    pub hangs_from: Option<Direction>,
}

impl TestBlock {
    pub const fn solid(id: &'static str) -> Self {
        Self { id, hangs_from: None }
    }

    pub const fn attached(id: &'static str, face: Direction) -> Self {
        Self {
            id,
            hangs_from: Some(face),
        }
    }
}

impl CapturedBlock for TestBlock {
    fn block_id(&self) -> &str {
        self.id
    }

    fn is_supported_from(&self, face: Direction) -> bool {
        self.hangs_from == Some(face)
    }
}

type RestoreHook = Arc<dyn Fn(&Location) + Send + Sync>;

#[derive(Default)]
pub struct TestWorld {
    blocks: Mutex<FxHashMap<Location, TestBlock>>,
    blocked: Mutex<FxHashSet<Location>>,
    removals: Mutex<Vec<Location>>,
    restore_hook: Mutex<Option<RestoreHook>>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, loc: &Location, block: TestBlock) {
        self.blocks.lock().insert(loc.clone(), block);
    }

    pub fn get(&self, loc: &Location) -> Option<TestBlock> {
        self.blocks.lock().get(loc).cloned()
    }

    /// Makes restores at `loc` fail as if something else was placed there.
    pub fn block(&self, loc: &Location) {
        self.blocked.lock().insert(loc.clone());
    }

    /// Runs `hook` at the start of every restore, before the block is placed.
    pub fn on_restore(&self, hook: impl Fn(&Location) + Send + Sync + 'static) {
        *self.restore_hook.lock() = Some(Arc::new(hook));
    }

    pub fn removals(&self) -> Vec<Location> {
        self.removals.lock().clone()
    }
}

impl BlockWorld for TestWorld {
    type Snapshot = TestBlock;

    fn capture_block(&self, loc: &Location) -> Option<TestBlock> {
        Some(
            self.get(loc)
                .unwrap_or_else(|| TestBlock::solid("minecraft:air")),
        )
    }

    fn remove_block(&self, loc: &Location) {
        self.blocks.lock().remove(loc);
        self.removals.lock().push(loc.clone());
    }

    fn restore_block(&self, loc: &Location, snapshot: &TestBlock) -> Result<(), RestoreError> {
        let hook = self.restore_hook.lock().clone();
        if let Some(hook) = hook {
            hook(loc);
        }
        if self.blocked.lock().contains(loc) {
            return Err(RestoreError::Occupied("minecraft:cobblestone".to_owned()));
        }
        self.blocks.lock().insert(loc.clone(), snapshot.clone());
        Ok(())
    }
}
