use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::content::remote::DEFAULT_API_BASE_URL;
use crate::content::SourceKind;

pub const API_BASE_URL_ENV: &str = "DACTYL_API_BASE_URL";
pub const MIN_MINUTES: u64 = 1;
pub const MAX_MINUTES: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub minutes: u64,
    pub source: SourceKind,
    pub api_base_url: String,
    pub test_id: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minutes: 4,
            source: SourceKind::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            test_id: None,
        }
    }
}

impl Config {
    /// Apply overrides from the environment, looked up through `var`
    pub fn with_env<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var(API_BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        self
    }

    pub fn duration_secs(&self) -> u64 {
        self.minutes.clamp(MIN_MINUTES, MAX_MINUTES) * 60
    }

    pub fn adjust_minutes(&mut self, delta: i64) {
        let minutes = self.minutes as i64 + delta;
        self.minutes = minutes.clamp(MIN_MINUTES as i64, MAX_MINUTES as i64) as u64;
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
        let path = if let Some(pd) = ProjectDirs::from("", "", "dactyl") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("dactyl_config.json")
        };
        Self { path }
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
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
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
