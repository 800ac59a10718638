// Configuration loading and parsing (scoreboard.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

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
// scoreboard.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    pub seed: SeedConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Database file. When omitted the platform data directory is used.
    #[serde(default)]
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Seed roster: a file path or an http(s) URL.
    pub players: String,
    pub images: String,
    /// Prefix joined to a picked image file name.
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub money_step: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig { money_step: 10.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            poll_interval_ms: 500,
        }
    }
}

fn default_image_dir() -> String {
    "/game_images".to_string()
}

impl Config {
    /// Exact match against the configured admin key. This only hides the
    /// admin view; it is not access control.
    pub fn admin_unlocked(&self, key: Option<&str>) -> bool {
        key == Some(self.admin.key.as_str())
    }

    /// The configured database path, or `scoreboard.db` in the platform data
    /// directory (falling back to the working directory).
    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.db_path {
            return PathBuf::from(path);
        }
        match ProjectDirs::from("", "", "scoreboard") {
            Some(dirs) => dirs.data_dir().join("scoreboard.db"),
            None => PathBuf::from("scoreboard.db"),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }

    /// Where a picked game image lives: `{image_dir}/{file}`.
    pub fn image_path(&self, file: &str) -> String {
        format!("{}/{}", self.seed.image_dir.trim_end_matches('/'), file)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/scoreboard.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("scoreboard.toml");
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// into `config/` first.
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

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.seed.players.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "seed.players".into(),
            message: "must not be empty".into(),
        });
    }

    if config.admin.key.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "admin.key".into(),
            message: "must not be empty".into(),
        });
    }

    let step = config.scoring.money_step;
    if !step.is_finite() || step <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "scoring.money_step".into(),
            message: format!("must be a positive number, got {step}"),
        });
    }

    if config.watch.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "watch.poll_interval_ms".into(),
            message: "must be > 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
