//! The two periodic drivers of the burnt block manager.
//!
//! - [`ReplaceTicker`] restores ready blocks. The host calls it every game
//!   tick from its world context, since restoring mutates the world.
//! - [`spawn_cleanup_task`] compacts the fire index and evicts expired
//!   cooldowns on a tokio worker. It never touches the world.

use std::sync::Arc;
use std::time::Duration;

use tokio::{
    select,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::burnt::{BurntBlockManager, TickReport};
use crate::clock::Clock;
use crate::world::BlockWorld;

/// Runs a restoration pass every `interval_ticks` game ticks.
pub struct ReplaceTicker<W: BlockWorld, C: Clock> {
    manager: Arc<BurntBlockManager<W, C>>,
    interval_ticks: u32,
    elapsed_ticks: u32,
}

impl<W: BlockWorld, C: Clock> ReplaceTicker<W, C> {
    /// Creates a ticker. The first pass runs after one full interval.
    #[must_use]
    pub fn new(manager: Arc<BurntBlockManager<W, C>>, interval_ticks: u32) -> Self {
        Self {
            manager,
            interval_ticks: interval_ticks.max(1),
            elapsed_ticks: 0,
        }
    }

    /// Advances one game tick, restoring ready blocks when the interval is up.
    ///
    /// Returns the pass report on the ticks a pass ran.
    pub fn tick(&mut self) -> Option<TickReport> {
        self.elapsed_ticks += 1;
        if self.elapsed_ticks < self.interval_ticks {
            return None;
        }
        self.elapsed_ticks = 0;

        let _span = tracing::info_span!("replace_burnt").entered();
        let report = self.manager.tick(self.manager.clock().now());
        if report.failed > 0 {
            log::warn!("{} burnt blocks could not be restored", report.failed);
        }
        Some(report)
    }

    /// Game ticks between two passes.
    #[must_use]
    pub fn interval_ticks(&self) -> u32 {
        self.interval_ticks
    }
}

/// Spawns the background cleanup task on the current tokio runtime.
///
/// Returns `None` in lightweight mode, where there is nothing to clean.
pub fn spawn_cleanup_task<W, C>(
    manager: Arc<BurntBlockManager<W, C>>,
    initial_delay: Duration,
    period: Duration,
    cancel_token: CancellationToken,
) -> Option<JoinHandle<()>>
where
    W: BlockWorld,
    C: Clock + 'static,
{
    if manager.settings().lightweight {
        return None;
    }

    let task = async move {
        let mut interval = time::interval_at(time::Instant::now() + initial_delay, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                () = cancel_token.cancelled() => {
                    break;
                }
                _ = interval.tick() => {
                    let report = manager.cleanup(manager.clock().now());
                    log::debug!(
                        "Burnt block cleanup: {} buckets reclaimed, {} cooldowns evicted",
                        report.buckets_reclaimed,
                        report.cooldowns_evicted
                    );
                }
            }
        }
        log::debug!("Burnt block cleanup task stopped");
    };

    Some(tokio::spawn(task.instrument(tracing::info_span!("burnt_cleanup"))))
}
