// Configuration loading and parsing (league.toml, engine.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use playoffcast_core::feed::Backoff;
use playoffcast_engine::optimizer::OptimizerConfig;
use playoffcast_engine::simulation::SimulationConfig;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub simulation: SimulationConfig,
    pub optimizer: OptimizerConfig,
    pub updater: UpdaterConfig,
    pub feed: FeedConfig,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    /// JSON league snapshot, relative to the working directory.
    pub snapshot_path: String,
    /// Optional head-to-head history CSV.
    #[serde(default)]
    pub history_path: Option<String>,
}

// ---------------------------------------------------------------------------
// engine.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire engine.toml file.
#[derive(Debug, Clone, Deserialize)]
struct EngineFile {
    #[serde(default)]
    simulation: SimulationConfig,
    #[serde(default)]
    optimizer: OptimizerConfig,
    #[serde(default)]
    updater: UpdaterConfig,
    feed: FeedConfig,
}

/// Real-time updater tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Quiet period that batches non-critical events.
    pub debounce_ms: u64,
    /// Minimum absolute change in championship probability that is
    /// published as a notification.
    pub significant_change: f64,
    pub full_update_secs: u64,
    pub max_concurrent_recomputes: usize,
    pub event_queue_capacity: usize,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        UpdaterConfig {
            debounce_ms: 5_000,
            significant_change: 0.05,
            full_update_secs: 30,
            max_concurrent_recomputes: 2,
            event_queue_capacity: 256,
        }
    }
}

impl UpdaterConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn full_update_interval(&self) -> Duration {
        Duration::from_secs(self.full_update_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_cap_ms() -> u64 {
    30_000
}

impl FeedConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_cap_ms),
        )
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/engine.toml`, relative to the given `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join(CONFIG_FILES[0]);
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- engine.toml (required) ---
    let engine_path = config_dir.join(CONFIG_FILES[1]);
    let engine_text = read_file(&engine_path)?;
    let engine_file: EngineFile =
        toml::from_str(&engine_text).map_err(|e| ConfigError::ParseError {
            path: engine_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        simulation: engine_file.simulation,
        optimizer: engine_file.optimizer,
        updater: engine_file.updater,
        feed: engine_file.feed,
    };

    validate(&config)?;

    Ok(config)
}

/// Files read by [`load_config_from`], in load order.
pub const CONFIG_FILES: [&str; 2] = ["league.toml", "engine.toml"];

/// Seeds `config/` with any of [`CONFIG_FILES`] it lacks, taken from
/// `defaults/`. Existing files are left alone; anything else under
/// `defaults/` (such as `*.example` templates) is ignored. Returns the
/// paths written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    match (defaults_dir.is_dir(), config_dir.is_dir()) {
        (false, false) => {
            return Err(copy_error(format!(
                "no defaults/ or config/ under {}",
                base_dir.display()
            )))
        }
        (false, true) => return Ok(Vec::new()),
        _ => {}
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("creating {}: {e}", config_dir.display())))?;

    let mut seeded = Vec::new();
    for name in CONFIG_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if source.is_file() && seed_file(&source, &target)? {
            seeded.push(target);
        }
    }
    Ok(seeded)
}

/// Copies `source` to `target` unless `target` already exists. Returns
/// whether anything was written.
fn seed_file(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match std::fs::File::options().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error(format!("creating {}: {e}", target.display()))),
    };
    let mut src = std::fs::File::open(source)
        .map_err(|e| copy_error(format!("opening {}: {e}", source.display())))?;
    std::io::copy(&mut src, &mut dest)
        .map_err(|e| copy_error(format!("writing {}: {e}", target.display())))?;
    Ok(true)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.snapshot_path.trim().is_empty() {
        return Err(invalid("league.snapshot_path", "must not be empty"));
    }

    let sim = &config.simulation;
    if sim.trials == 0 {
        return Err(invalid("simulation.trials", "must be greater than 0"));
    }
    if sim.playoff_field_size < 2 {
        return Err(invalid(
            "simulation.playoff_field_size",
            format!("must be at least 2, got {}", sim.playoff_field_size),
        ));
    }
    if sim.chunks == 0 {
        return Err(invalid("simulation.chunks", "must be greater than 0"));
    }

    let opt = &config.optimizer;
    if opt.combine_top == 0 {
        return Err(invalid("optimizer.combine_top", "must be greater than 0"));
    }

    let up = &config.updater;
    let count_fields: &[(&str, u64)] = &[
        ("updater.debounce_ms", up.debounce_ms),
        ("updater.full_update_secs", up.full_update_secs),
        (
            "updater.max_concurrent_recomputes",
            up.max_concurrent_recomputes as u64,
        ),
        ("updater.event_queue_capacity", up.event_queue_capacity as u64),
    ];
    for (name, val) in count_fields {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }
    if !(0.0..=1.0).contains(&up.significant_change) {
        return Err(invalid(
            "updater.significant_change",
            format!(
                "must be between 0.0 and 1.0 inclusive, got {}",
                up.significant_change
            ),
        ));
    }

    let feed = &config.feed;
    if !(feed.url.starts_with("ws://") || feed.url.starts_with("wss://")) {
        return Err(invalid(
            "feed.url",
            format!("must be a ws:// or wss:// URL, got `{}`", feed.url),
        ));
    }
    if feed.backoff_base_ms == 0 {
        return Err(invalid("feed.backoff_base_ms", "must be > 0"));
    }
    if feed.backoff_cap_ms < feed.backoff_base_ms {
        return Err(invalid(
            "feed.backoff_cap_ms",
            format!(
                "must be >= backoff_base_ms ({}), got {}",
                feed.backoff_base_ms, feed.backoff_cap_ms
            ),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
