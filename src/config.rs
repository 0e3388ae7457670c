use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::corpus::Difficulty;
use crate::session::{SessionConfig, DEFAULT_DURATION_SECS};

/// Settings remembered between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub duration_secs: u32,
    pub user_name: Option<String>,
    pub corpus_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            duration_secs: DEFAULT_DURATION_SECS,
            user_name: None,
            corpus_path: None,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            difficulty: self.difficulty,
            duration_secs: if self.duration_secs == 0 {
                DEFAULT_DURATION_SECS
            } else {
                self.duration_secs
            },
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable config falls back to defaults
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

/// Settings named in a launch query such as `difficulty=hard&duration=120`.
/// Keys that are absent or carry an invalid value stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchParams {
    pub difficulty: Option<Difficulty>,
    pub duration_secs: Option<u32>,
}

impl LaunchParams {
    /// Unknown keys are ignored
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();

        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key.trim() {
                "difficulty" => params.difficulty = value.parse().ok(),
                "duration" => {
                    params.duration_secs = value.trim().parse::<u32>().ok().filter(|&d| d > 0);
                }
                _ => {}
            }
        }

        params
    }

    /// Overwrite only the settings the query named
    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(difficulty) = self.difficulty {
            cfg.difficulty = difficulty;
        }
        if let Some(secs) = self.duration_secs {
            cfg.duration_secs = secs;
        }
    }

    /// Complete session settings, defaulting whatever the query left out
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            difficulty: self.difficulty.unwrap_or_default(),
            duration_secs: self.duration_secs.unwrap_or(DEFAULT_DURATION_SECS),
        }
    }
}

/// Session settings from a launch query, with defaults for missing or invalid values
pub fn parse_launch_query(query: &str) -> SessionConfig {
    LaunchParams::parse(query).session_config()
}

/// Quick-start presets offered on the setup screen
pub const QUICK_STARTS: [&str; 3] = [
    "difficulty=easy&duration=30",
    "difficulty=medium&duration=60",
    "difficulty=hard&duration=120",
];
