use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::{fs, path::Path, path::PathBuf};

const APP_DIR: &str = ".tracechain";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Signing key file used by the CLI
    pub key_path: String,
    /// Base URL the CLI sends requests to
    pub node_rpc_url: String,
    /// Address the node listens on
    pub bind_addr: String,
    /// Optional snapshot file: loaded at node start, written on shutdown
    pub snapshot_path: Option<String>,
}

impl Config {
    fn expand_path(path: &str) -> PathBuf {
        let expanded = shellexpand::tilde(path);
        PathBuf::from(expanded.into_owned())
    }

    /// Compute the default key path depending on the target OS.
    fn default_key_path() -> String {
        // Use a Windows-friendly folder when building on Windows to avoid tilde expansion issues.
        if cfg!(target_os = "windows") {
            if let Some(base) = dirs::data_dir() {
                return base
                    .join("Tracechain")
                    .join("key.json")
                    .to_string_lossy()
                    .into_owned();
            }
        }

        format!("~/{}/key.json", APP_DIR)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot find home directory"))?;
        Ok(home.join(APP_DIR).join("config.json"))
    }

    /// Key path with tilde expansion applied.
    pub fn key_path_resolved(&self) -> PathBuf {
        Self::expand_path(&self.key_path)
    }

    pub fn snapshot_path_resolved(&self) -> Option<PathBuf> {
        self.snapshot_path.as_deref().map(Self::expand_path)
    }

    pub fn bind_socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .with_context(|| format!("invalid bind_addr {:?}", self.bind_addr))
    }

    /// Load the config from its default location, writing the defaults first
    /// if no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::info!(
                "Configuration file not found, creating default configuration: {}",
                path.display()
            );
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("couldn't read config file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid JSON in config file {}", path.display()))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("couldn't create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("couldn't write {}", path.display()))
    }

    /// Update one field by name. Does not persist.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "key_path" => self.key_path = value.to_string(),
            "node_rpc_url" => self.node_rpc_url = value.trim_end_matches('/').to_string(),
            "bind_addr" => {
                value
                    .parse::<SocketAddr>()
                    .with_context(|| format!("invalid socket address {:?}", value))?;
                self.bind_addr = value.to_string();
            }
            "snapshot_path" => {
                let value = value.trim();
                self.snapshot_path = (!value.is_empty()).then(|| value.to_string());
            }
            _ => return Err(anyhow!("unknown configuration key: {}", key)),
        }
        Ok(())
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Overwrite the default location with default values.
    pub fn init_default() -> Result<PathBuf> {
        Self::default().save()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_path: Self::default_key_path(),
            node_rpc_url: "http://127.0.0.1:19533".to_string(),
            bind_addr: "127.0.0.1:19533".to_string(),
            snapshot_path: None,
        }
    }
}
