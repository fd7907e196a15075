//! # Ember
//!
//! Host integration for burnt block restoration: the service a server embeds,
//! the logger, and an in-memory world.
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(
    clippy::single_call_fn,
    clippy::multiple_inherent_impl,
    clippy::shadow_unrelated,
    clippy::missing_errors_doc,
    clippy::struct_excessive_bools,
    clippy::needless_pass_by_value,
    clippy::cargo_common_metadata
)]
use std::{mem, sync::Arc};

use ember_core::{
    BlockWorld, BurntBlockManager, Clock, SystemClock,
    burnt::TickReport,
    config::{ConfigError, ConfigHandle},
    driver::{ReplaceTicker, spawn_cleanup_task},
    listener::{BurnListener, BurnOutcome, IgniteVerdict},
};
use ember_utils::{Location, WorldId};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Logger setup.
pub mod logger;
/// An in-memory `BlockWorld`.
pub mod memory_world;

/// Burnt block restoration as a server embeds it.
///
/// Owns the manager, both drivers and the config handle.
pub struct EmberHeal<W: BlockWorld, C: Clock + 'static = SystemClock> {
    /// The cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
    config: Arc<ConfigHandle>,
    manager: Arc<BurntBlockManager<W, C>>,
    listener: BurnListener<W, C>,
    ticker: Mutex<ReplaceTicker<W, C>>,
    cleanup_task: Mutex<Option<JoinHandle<()>>>,
}

impl<W: BlockWorld> EmberHeal<W> {
    /// Creates the service on the system clock.
    #[must_use]
    pub fn new(world: Arc<W>, config: Arc<ConfigHandle>) -> Self {
        Self::with_clock(world, Arc::new(SystemClock), config)
    }
}

impl<W: BlockWorld, C: Clock + 'static> EmberHeal<W, C> {
    /// Creates the service on a custom clock.
    #[must_use]
    pub fn with_clock(world: Arc<W>, clock: Arc<C>, config: Arc<ConfigHandle>) -> Self {
        let current = config.get();
        let manager = Arc::new(BurntBlockManager::new(world, clock, current.burn_settings()));

        Self {
            cancel_token: CancellationToken::new(),
            listener: BurnListener::new(manager.clone(), config.clone()),
            ticker: Mutex::new(ReplaceTicker::new(manager.clone(), current.replace_interval_ticks)),
            cleanup_task: Mutex::new(None),
            config,
            manager,
        }
    }

    /// Starts the background cleanup task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let config = self.config.get();
        let settings = self.manager.settings();
        log::info!(
            "Restoring burnt blocks after {}s, fireproof for {}s, checking every {} ticks",
            settings.burn_delay.as_secs(),
            settings.cooldown.as_secs(),
            self.ticker.lock().interval_ticks()
        );

        let handle = spawn_cleanup_task(
            self.manager.clone(),
            config.cleanup_initial_delay(),
            config.cleanup_interval(),
            self.cancel_token.child_token(),
        );
        match &handle {
            Some(_) => log::info!(
                "Burnt block cleanup every {}s",
                config.cleanup_interval().as_secs()
            ),
            None => log::info!("Lightweight mode, burnt block cleanup disabled"),
        }
        if let Some(previous) = mem::replace(&mut *self.cleanup_task.lock(), handle) {
            previous.abort();
        }
    }

    /// Stops the background task and waits for it to exit.
    pub async fn stop(&self) {
        self.cancel_token.cancel();
        let handle = self.cleanup_task.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            log::warn!("Burnt block cleanup task ended abnormally: {e}");
        }
    }

    /// Advances one game tick. Call from the world context every tick.
    pub fn game_tick(&self) -> Option<TickReport> {
        self.ticker.lock().tick()
    }

    /// Forwards a block burn event. See [`BurnListener::on_block_burn`].
    pub fn on_block_burn(&self, location: &Location) -> BurnOutcome {
        self.listener.on_block_burn(location)
    }

    /// Forwards a block ignite event. See [`BurnListener::on_block_ignite`].
    #[must_use]
    pub fn on_block_ignite(&self, location: &Location) -> IgniteVerdict {
        self.listener.on_block_ignite(location)
    }

    /// Restores every pending block of `world` right away.
    pub fn force_replace(&self, world: &WorldId) -> TickReport {
        self.manager.force_replace(world)
    }

    /// Restores every pending block of every configured world, and of any
    /// other world that still has pending blocks.
    pub fn force_replace_all(&self) -> TickReport {
        let config = self.config.get();
        let mut worlds: Vec<WorldId> = config.worlds.keys().cloned().collect();
        for world in self.manager.pending_worlds() {
            if !worlds.contains(&world) {
                worlds.push(world);
            }
        }

        let mut total = TickReport::default();
        for world in &worlds {
            let report = self.manager.force_replace(world);
            total.restored += report.restored;
            total.failed += report.failed;
        }
        total
    }

    /// Re-reads the config file.
    ///
    /// World filters apply right away. Timing changes need a restart.
    pub fn reload_config(&self) -> Result<(), ConfigError> {
        self.config.reload()?;
        if self.config.get().burn_settings() != *self.manager.settings() {
            log::warn!("Burn timing changed, restart to apply it");
        }
        Ok(())
    }

    /// The shared config handle.
    #[must_use]
    pub fn config(&self) -> &Arc<ConfigHandle> {
        &self.config
    }

    /// The burnt block manager.
    #[must_use]
    pub fn manager(&self) -> &Arc<BurntBlockManager<W, C>> {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ember_core::{ManualClock, config::EmberConfig};
    use ember_utils::{BlockPos, Direction};

    use super::*;
    use crate::memory_world::{MemoryBlock, MemoryWorld};

    const CONFIG: &str = r#"{
        burn_delay_secs: 2,
        burn_cooldown_secs: 10,
        replace_interval_ticks: 20,
        worlds: {
            world: { replace_black_list: ["minecraft:netherrack"] },
            world_nether: {},
        },
    }"#;

    type Service = EmberHeal<MemoryWorld, ManualClock>;

    fn service(config: &str) -> (Service, Arc<MemoryWorld>, Arc<ManualClock>) {
        let world = Arc::new(MemoryWorld::new([
            WorldId::new("world"),
            WorldId::new("world_nether"),
            WorldId::new("world_the_end"),
        ]));
        let clock = Arc::new(ManualClock::new());
        let config = Arc::new(ConfigHandle::from_config(
            EmberConfig::from_json5(config).expect("test config parses"),
        ));
        (
            EmberHeal::with_clock(world.clone(), clock.clone(), config),
            world,
            clock,
        )
    }

    fn loc(world: &str, x: i32, y: i32, z: i32) -> Location {
        Location::new(WorldId::new(world), BlockPos::new(x, y, z))
    }

    /// Runs `ticks` game ticks at 20 TPS, returning the restored count.
    fn run_ticks(service: &Service, clock: &ManualClock, ticks: u32) -> usize {
        let mut restored = 0;
        for _ in 0..ticks {
            clock.advance(Duration::from_millis(50));
            if let Some(report) = service.game_tick() {
                restored += report.restored;
            }
        }
        restored
    }

    #[test]
    fn test_burnt_house_is_rebuilt() {
        let (service, world, clock) = service(CONFIG);
        let wall: Vec<Location> = (0..4).map(|x| loc("world", x, 64, 0)).collect();
        for at in &wall {
            world.set_block(at, MemoryBlock::new("minecraft:oak_planks"));
        }
        let torch = loc("world", 0, 64, -1);
        world.set_block(&torch, MemoryBlock::attached("minecraft:wall_torch", Direction::North));

        assert_eq!(
            service.on_block_burn(&wall[0]),
            BurnOutcome::Recorded { dependents: 1 }
        );
        for at in &wall[1..] {
            assert_eq!(
                service.on_block_burn(at),
                BurnOutcome::Recorded { dependents: 0 }
            );
        }
        assert_eq!(world.block_count(), 0);
        assert_eq!(
            service.on_block_ignite(&loc("world", 4, 64, 0)),
            IgniteVerdict::Allow { cascade: true }
        );

        assert_eq!(run_ticks(&service, &clock, 39), 0);
        assert_eq!(run_ticks(&service, &clock, 1), 1);
        assert_eq!(world.block_count(), 1);
        for at in &wall[1..] {
            assert!(service.manager().is_pending(at));
        }
        assert_eq!(run_ticks(&service, &clock, 20), 4);
        assert_eq!(world.block_at(&torch).id(), "minecraft:wall_torch");
        assert!(service.manager().is_empty());

        for at in &wall {
            assert_eq!(service.on_block_ignite(at), IgniteVerdict::Cancel);
        }
    }

    #[test]
    fn test_placed_block_wins_over_restore() {
        let (service, world, clock) = service(CONFIG);
        let at = loc("world", 0, 64, 0);
        world.set_block(&at, MemoryBlock::new("minecraft:oak_planks"));
        service.on_block_burn(&at);

        world.set_block(&at, MemoryBlock::new("minecraft:cobblestone"));
        let mut failed = 0;
        for _ in 0..40 {
            clock.advance(Duration::from_millis(50));
            if let Some(report) = service.game_tick() {
                failed += report.failed;
            }
        }

        assert_eq!(failed, 1);
        assert_eq!(world.block_at(&at).id(), "minecraft:cobblestone");
        assert!(service.manager().is_empty());
        assert!(!service.manager().is_on_cooldown(&at));
    }

    #[test]
    fn test_force_replace_all_covers_unconfigured_worlds() {
        let (service, world, _clock) = service(CONFIG);
        let targets = [
            loc("world", 0, 64, 0),
            loc("world_nether", 0, 64, 0),
            loc("world_the_end", 0, 64, 0),
        ];
        for at in &targets {
            world.set_block(at, MemoryBlock::new("minecraft:oak_planks"));
            service.on_block_burn(at);
        }

        let report = service.force_replace(&WorldId::new("world_nether"));
        assert_eq!(report, TickReport { restored: 1, failed: 0 });

        let report = service.force_replace_all();
        assert_eq!(report, TickReport { restored: 2, failed: 0 });
        assert_eq!(world.block_count(), 3);
        assert!(service.manager().is_empty());
    }

    #[test]
    fn test_black_listed_block_burns_for_good() {
        let (service, world, clock) = service(CONFIG);
        let at = loc("world", 0, 64, 0);
        world.set_block(&at, MemoryBlock::new("minecraft:netherrack"));

        assert!(matches!(service.on_block_burn(&at), BurnOutcome::Skipped(_)));
        assert_eq!(run_ticks(&service, &clock, 60), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop() {
        let (service, _world, _clock) = service(CONFIG);
        service.start();
        assert!(service.cleanup_task.lock().is_some());

        service.stop().await;
        assert!(service.cancel_token.is_cancelled());
        assert!(service.cleanup_task.lock().is_none());
    }

    #[tokio::test]
    async fn test_lightweight_mode_has_no_cleanup_task() {
        let (service, world, clock) = service(
            "{ burn_delay_secs: 2, burn_cooldown_secs: 10, lightweight_mode: true }",
        );
        service.start();
        assert!(service.cleanup_task.lock().is_none());

        let at = loc("world", 0, 64, 0);
        world.set_block(&at, MemoryBlock::new("minecraft:oak_planks"));
        service.on_block_burn(&at);
        assert_eq!(run_ticks(&service, &clock, 40), 1);
        assert_eq!(
            service.on_block_ignite(&at),
            IgniteVerdict::Allow { cascade: false }
        );
        service.stop().await;
    }
}
