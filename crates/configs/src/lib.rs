use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Unix permission bits applied to written snapshots.
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,
    /// Store the snapshot on this interval as well as at shutdown.
    #[serde(default)]
    pub snapshot_interval_secs: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { data_file: default_data_file(), file_mode: default_file_mode(), snapshot_interval_secs: None }
    }
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 3890 }
fn default_data_file() -> PathBuf { PathBuf::from("data/authsv.json") }
fn default_file_mode() -> u32 { 0o600 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

/// Parse an octal mode such as `600` or `0o600`.
pub fn parse_file_mode(s: &str) -> Result<u32> {
    let digits = s.trim().trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8).map_err(|e| anyhow!("invalid file mode {s:?}: {e}"))?;
    if mode > 0o777 {
        return Err(anyhow!("file mode {s:?} exceeds 0o777"));
    }
    Ok(mode)
}

impl AppConfig {
    /// Config file (`$CONFIG_PATH` or `config.toml` when `path` is `None`),
    /// then env overrides. Not validated; callers layer their own overrides
    /// and finish with [`Self::normalize_and_validate`].
    ///
    /// An explicit `path` must exist; the default location may be absent.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => load_from_file(path)?,
            None => match load_default() {
                Ok(cfg) => cfg,
                Err(e) if is_not_found(&e) => AppConfig::default(),
                Err(e) => return Err(e),
            },
        };
        cfg.apply_env();
        Ok(cfg)
    }

    /// `SERVER_HOST`, `SERVER_PORT` and `AUTHSV_DATA_FILE` override the file.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Ok(file) = std::env::var("AUTHSV_DATA_FILE") {
            self.store.data_file = PathBuf::from(file);
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>().is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_file.as_os_str().is_empty() {
            return Err(anyhow!("store.data_file is empty; set it in config.toml or AUTHSV_DATA_FILE"));
        }
        if self.file_mode > 0o777 {
            return Err(anyhow!("store.file_mode must be <= 0o777"));
        }
        if self.snapshot_interval_secs == Some(0) {
            return Err(anyhow!("store.snapshot_interval_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}
