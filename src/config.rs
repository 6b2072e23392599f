use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;
use tracing::Level;

use crate::http::parser::MAX_HEAD_SIZE;

/// Server configuration.
///
/// Every field has a default, so a YAML file only needs the keys it
/// changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// Upper bound on an unparsed request head, in bytes
    pub max_head_size: usize,
    /// One of `trace`, `debug`, `info`, `warn`, `error`
    pub log_level: String,
    pub static_files: StaticFilesConfig,
    pub sheep: SheepConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// URI prefix, e.g. `/files/`
    pub mount: String,
    /// Directory the mount maps onto
    pub root: PathBuf,
    /// Served in place of a listing when a directory contains it
    pub index_file: String,
}

/// Pacing for the `/sheep` streaming route.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheepConfig {
    pub count: u32,
    pub interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            max_head_size: MAX_HEAD_SIZE,
            log_level: "info".to_string(),
            static_files: StaticFilesConfig::default(),
            sheep: SheepConfig::default(),
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            mount: "/files/".to_string(),
            root: PathBuf::from("public"),
            index_file: "index.html".to_string(),
        }
    }
}

impl Default for SheepConfig {
    fn default() -> Self {
        Self {
            count: 100,
            interval_ms: 1000,
        }
    }
}

impl Config {
    /// Loads the YAML file named by `CONFIG` (if set), then applies
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let cfg = match std::env::var("CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        Ok(cfg.with_env(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading config file {path}"))?;
        Self::from_yaml(&raw).with_context(|| format!("parsing config file {path}"))
    }

    /// Parses YAML and rejects an unknown `log_level`.
    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_yaml::from_str(raw)?;
        cfg.tracing_level()?;
        Ok(cfg)
    }

    pub fn tracing_level(&self) -> anyhow::Result<Level> {
        self.log_level
            .parse()
            .with_context(|| format!("invalid log_level {:?}", self.log_level))
    }

    /// `LISTEN` overrides the listen address.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(addr) = lookup("LISTEN") {
            self.listen_addr = addr;
        }
        self
    }
}
