//! Demo server: burns down a small cabin in an in-memory world and ticks at
//! 20 TPS until it has been rebuilt.
use std::{sync::Arc, time::Duration};

use ember::{
    EmberHeal, logger,
    memory_world::{MemoryBlock, MemoryWorld},
};
use ember_core::config::{ConfigHandle, DEFAULT_CONFIG_PATH, TICKS_PER_SECOND};
use ember_utils::{BlockPos, Direction, Location, WorldId};
use tokio::{
    select, signal,
    time::{self, MissedTickBehavior},
};

/// Builds a 5x3x5 plank cabin with torches on its outer walls.
fn build_cabin(world: &MemoryWorld, origin: &Location) -> Vec<Location> {
    let mut blocks = Vec::new();
    for x in 0..5 {
        for y in 0..3 {
            for z in 0..5 {
                let on_wall = x == 0 || x == 4 || z == 0 || z == 4;
                if on_wall || y == 2 {
                    let at = origin.offset(x, y, z);
                    world.set_block(&at, MemoryBlock::new("minecraft:oak_planks"));
                    blocks.push(at);
                }
            }
        }
    }
    world.set_block(
        &origin.offset(2, 1, -1),
        MemoryBlock::attached("minecraft:wall_torch", Direction::North),
    );
    world.set_block(
        &origin.offset(5, 1, 2),
        MemoryBlock::attached("minecraft:wall_torch", Direction::East),
    );
    world.set_block(
        &origin.offset(2, 3, 2),
        MemoryBlock::attached("minecraft:torch", Direction::Up),
    );
    blocks
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init()?;

    let config = Arc::new(ConfigHandle::load(DEFAULT_CONFIG_PATH)?);
    let overworld = WorldId::new("world");
    let world = Arc::new(MemoryWorld::new([overworld.clone()]));
    let ember = EmberHeal::new(world.clone(), config);
    ember.start();

    let origin = Location::new(overworld, BlockPos::new(0, 64, 0));
    let cabin = build_cabin(&world, &origin);
    log::info!("Built a cabin of {} blocks", world.block_count());

    for at in &cabin {
        ember.on_block_burn(at);
    }
    log::info!(
        "Cabin burnt down, {} blocks waiting for restoration",
        ember.manager().pending_count()
    );

    let mut game_tick = time::interval(Duration::from_secs(1) / TICKS_PER_SECOND);
    game_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        select! {
            result = signal::ctrl_c() => {
                result?;
                log::info!("Interrupted, restoring everything now");
                ember.force_replace_all();
                break;
            }
            _ = game_tick.tick() => {
                if let Some(report) = ember.game_tick()
                    && report.restored > 0
                {
                    log::info!("Restored {} blocks", report.restored);
                }
                if ember.manager().is_empty() {
                    break;
                }
            }
        }
    }

    log::info!("Cabin rebuilt, {} blocks in the world", world.block_count());
    ember.stop().await;
    Ok(())
}
