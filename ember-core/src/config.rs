//! Configuration for burnt block restoration.
//!
//! The config lives in a JSON5 file. A missing file is created from the
//! bundled default, a file missing one of the timing keys is rejected.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
    time::Duration,
};

use arc_swap::ArcSwap;
use ember_utils::WorldId;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use thiserror::Error;

use crate::burnt::RecordKind;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/ember_config.json5");

/// Where the host looks for the config file.
pub const DEFAULT_CONFIG_PATH: &str = "config/ember_config.json5";

/// Game ticks per second of the host server.
pub const TICKS_PER_SECOND: u32 = 20;

static DEFAULT_WORLD: LazyLock<WorldConfig> = LazyLock::new(WorldConfig::default);

/// Errors raised while loading the config.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or created.
    #[error("could not access config file: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid JSON5, or a required key is missing.
    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Top level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmberConfig {
    /// Seconds a burnt block stays gone before it is put back.
    pub burn_delay_secs: u64,
    /// Seconds a restored block cannot burn again.
    pub burn_cooldown_secs: u64,
    /// Extra delay for blocks that hung on a burnt block.
    #[serde(default = "default_dependent_delay_ms")]
    pub dependent_delay_ms: u64,
    /// Skip the fire index and the cooldown cache.
    #[serde(default)]
    pub lightweight_mode: bool,
    /// Game ticks between two restoration passes.
    #[serde(default = "default_replace_interval_ticks")]
    pub replace_interval_ticks: u32,
    /// Seconds between two cleanups.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Seconds before the first cleanup.
    #[serde(default = "default_cleanup_initial_delay_secs")]
    pub cleanup_initial_delay_secs: u64,
    /// Per world settings. Worlds not listed use [`WorldConfig::default`].
    #[serde(default)]
    pub worlds: FxHashMap<WorldId, WorldConfig>,
}

const fn default_dependent_delay_ms() -> u64 {
    100
}

const fn default_replace_interval_ticks() -> u32 {
    TICKS_PER_SECOND
}

const fn default_cleanup_interval_secs() -> u64 {
    600
}

const fn default_cleanup_initial_delay_secs() -> u64 {
    10
}

impl EmberConfig {
    /// Loads the config at `path`, writing the default one first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let config_str = if path.exists() {
            fs::read_to_string(path)?
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            log::info!("Created default config at {}", path.display());
            DEFAULT_CONFIG.to_owned()
        };

        Self::from_json5(&config_str)
    }

    /// Parses and validates a config.
    pub fn from_json5(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json5::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=86_400).contains(&self.burn_delay_secs) {
            return Err(ConfigError::Invalid("Burn delay must be in range 1..86400 seconds"));
        }
        if self.burn_cooldown_secs > 86_400 {
            return Err(ConfigError::Invalid("Burn cooldown must be at most 86400 seconds"));
        }
        if self.dependent_delay_ms > 60_000 {
            return Err(ConfigError::Invalid("Dependent delay must be at most 60000 milliseconds"));
        }
        if self.replace_interval_ticks == 0 {
            return Err(ConfigError::Invalid("Replace interval must be at least one tick"));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid("Cleanup interval must be at least one second"));
        }
        Ok(())
    }

    /// Settings for `world`, or the defaults if it has none.
    #[must_use]
    pub fn world(&self, world: &WorldId) -> &WorldConfig {
        self.worlds.get(world).unwrap_or(&*DEFAULT_WORLD)
    }

    /// Scheduler timing derived from this config.
    #[must_use]
    pub fn burn_settings(&self) -> BurnSettings {
        BurnSettings {
            burn_delay: Duration::from_secs(self.burn_delay_secs),
            dependent_delay: Duration::from_millis(self.dependent_delay_ms),
            cooldown: Duration::from_secs(self.burn_cooldown_secs),
            lightweight: self.lightweight_mode,
        }
    }

    /// Time between two cleanups.
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Time before the first cleanup.
    #[must_use]
    pub fn cleanup_initial_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_initial_delay_secs)
    }
}

/// Settings of a single world.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Whether burnt blocks are restored in this world.
    pub replace_burnt: bool,
    /// Restore only the blocks on the white list instead of all but the black list.
    pub use_replace_white_list: bool,
    /// Block ids that are never restored.
    pub replace_black_list: FxHashSet<String>,
    /// Block ids restored when the white list is in use.
    pub replace_white_list: FxHashSet<String>,
}

impl WorldConfig {
    /// Whether blocks of type `block_id` must be left burnt.
    #[must_use]
    pub fn is_black_listed(&self, block_id: &str) -> bool {
        if self.use_replace_white_list {
            !self.replace_white_list.contains(block_id)
        } else {
            self.replace_black_list.contains(block_id)
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            replace_burnt: true,
            use_replace_white_list: false,
            replace_black_list: FxHashSet::default(),
            replace_white_list: FxHashSet::default(),
        }
    }
}

/// Timing used by the restoration scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnSettings {
    /// Delay before a primary burnt block is restored.
    pub burn_delay: Duration,
    /// Extra delay for dependent blocks.
    pub dependent_delay: Duration,
    /// How long a restored block is fireproof.
    pub cooldown: Duration,
    /// Skip the fire index and the cooldown cache.
    pub lightweight: bool,
}

impl BurnSettings {
    /// Delay between recording a block of `kind` and restoring it.
    #[must_use]
    pub fn delay_for(&self, kind: RecordKind) -> Duration {
        match kind {
            RecordKind::Primary => self.burn_delay,
            RecordKind::Dependent => self.burn_delay + self.dependent_delay,
        }
    }
}

/// A reloadable handle to the config file.
///
/// Readers get a cheap snapshot. A reload that fails keeps the previous config.
pub struct ConfigHandle {
    current: ArcSwap<EmberConfig>,
    path: Option<PathBuf>,
}

impl ConfigHandle {
    /// Loads the config at `path`, creating it if needed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = EmberConfig::load_or_create(&path)?;
        Ok(Self {
            current: ArcSwap::from_pointee(config),
            path: Some(path),
        })
    }

    /// Wraps an in-memory config that has no backing file.
    #[must_use]
    pub fn from_config(config: EmberConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
            path: None,
        }
    }

    /// The current config.
    #[must_use]
    pub fn get(&self) -> Arc<EmberConfig> {
        self.current.load_full()
    }

    /// Re-reads the config file.
    ///
    /// Timing changes only apply to managers created afterwards, world
    /// settings apply immediately.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let config = EmberConfig::load_or_create(path)?;
        self.current.store(Arc::new(config));
        log::info!("Reloaded config from {}", path.display());
        Ok(())
    }

    /// Replaces the config without touching the file.
    pub fn replace(&self, config: EmberConfig) {
        self.current.store(Arc::new(config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "{ burn_delay_secs: 5, burn_cooldown_secs: 10 }";

    #[test]
    fn test_default_config_is_valid() {
        let config = EmberConfig::from_json5(DEFAULT_CONFIG).expect("default config parses");
        assert_eq!(config.burn_delay_secs, 45);
        assert_eq!(config.dependent_delay_ms, 100);
        assert!(config.world(&WorldId::new("world")).is_black_listed("minecraft:tnt"));
    }

    #[test]
    fn test_optional_keys_have_defaults() {
        let config = EmberConfig::from_json5(MINIMAL).expect("minimal config parses");
        assert_eq!(config.dependent_delay_ms, 100);
        assert_eq!(config.replace_interval_ticks, TICKS_PER_SECOND);
        assert_eq!(config.cleanup_interval(), Duration::from_secs(600));
        assert!(!config.lightweight_mode);
        assert!(config.worlds.is_empty());
    }

    #[test]
    fn test_missing_timing_keys_fail() {
        let result = EmberConfig::from_json5("{ burn_delay_secs: 5 }");
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        let result = EmberConfig::from_json5("{ burn_cooldown_secs: 5 }");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_ranges() {
        let result = EmberConfig::from_json5("{ burn_delay_secs: 0, burn_cooldown_secs: 10 }");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = EmberConfig::from_json5(
            "{ burn_delay_secs: 5, burn_cooldown_secs: 10, replace_interval_ticks: 0 }",
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_burn_settings_delays() {
        let settings = EmberConfig::from_json5(MINIMAL)
            .expect("minimal config parses")
            .burn_settings();
        assert_eq!(settings.delay_for(RecordKind::Primary), Duration::from_secs(5));
        assert_eq!(settings.delay_for(RecordKind::Dependent), Duration::from_millis(5100));
        assert_eq!(settings.cooldown, Duration::from_secs(10));
    }

    #[test]
    fn test_world_lists() {
        let config = EmberConfig::from_json5(
            r#"{
                burn_delay_secs: 5,
                burn_cooldown_secs: 10,
                worlds: {
                    world: { replace_black_list: ["minecraft:tnt"] },
                    creative: { use_replace_white_list: true, replace_white_list: ["minecraft:oak_planks"] },
                    lobby: { replace_burnt: false },
                },
            }"#,
        )
        .expect("config parses");

        let world = config.world(&WorldId::new("world"));
        assert!(world.replace_burnt);
        assert!(world.is_black_listed("minecraft:tnt"));
        assert!(!world.is_black_listed("minecraft:oak_planks"));

        let creative = config.world(&WorldId::new("creative"));
        assert!(creative.is_black_listed("minecraft:tnt"));
        assert!(!creative.is_black_listed("minecraft:oak_planks"));

        assert!(!config.world(&WorldId::new("lobby")).replace_burnt);

        let unknown = config.world(&WorldId::new("unknown"));
        assert!(unknown.replace_burnt);
        assert!(!unknown.is_black_listed("minecraft:tnt"));
    }

    #[test]
    fn test_handle_replace() {
        let handle = ConfigHandle::from_config(EmberConfig::from_json5(MINIMAL).expect("parses"));
        assert_eq!(handle.get().burn_delay_secs, 5);
        assert!(handle.reload().is_ok());

        let mut next = (*handle.get()).clone();
        next.burn_delay_secs = 30;
        handle.replace(next);
        assert_eq!(handle.get().burn_delay_secs, 30);
    }
}
