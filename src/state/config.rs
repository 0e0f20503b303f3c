use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    /// Bounds every request/response call, including the slow `POST /convert`.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: 600,
            connect_timeout_secs: 10,
            data_dir: PathBuf::from(".pconv"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML from {:?}", path))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content =
            toml::to_string_pretty(&self).with_context(|| "Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(path, content).with_context(|| format!("Failed to write config to {:?}", path))
    }

    /// Defaults, then `<data_dir>/config.toml` when present.
    pub fn load_or_default(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join("config.toml");
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(url) = lookup("PCONV_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(secs) = lookup("PCONV_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("PCONV_TIMEOUT_SECS is not a number: {}", secs))?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    pub fn credentials_dir(&self) -> PathBuf {
        self.data_dir.join("credentials")
    }
}
