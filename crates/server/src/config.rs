//! Server configuration.
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};
use url::Url;

/// Configuration for the web server.
#[derive(Default, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Storage for the database.
    pub storage: StorageConfig,

    /// Configuration for the network.
    pub net: NetworkConfig,

    /// Configuration for the recovery protocol.
    pub recovery: RecoveryConfig,

    /// Path the file was loaded from used to determine
    /// relative paths.
    #[serde(skip)]
    file: Option<PathBuf>,
}

/// Server network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub bind: SocketAddr,

    /// Configuration for CORS.
    pub cors: Option<CorsConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(
                IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
                5059,
            ),
            cors: None,
        }
    }
}

/// Configuration for CORS.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// List of additional CORS origins for the server.
    pub origins: Vec<Url>,
}

/// Configuration for storage locations.
#[derive(Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the database file.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("recovery.db"),
        }
    }
}

/// Configuration for the recovery protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Veto window in hours between a recovery request and its
    /// earliest completion.
    pub timelock_hours: i64,

    /// Public base URL for veto links sent to owners.
    pub cancel_url: Url,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            timelock_hours: svr_recovery::DEFAULT_TIMELOCK_HOURS,
            cancel_url: Url::parse("http://localhost:5059/recover/cancel")
                .unwrap(),
        }
    }
}

impl ServerConfig {
    /// Load a server config from a file path.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().is_file() {
            return Err(Error::NotFile(path.as_ref().to_path_buf()));
        }

        let contents = tokio::fs::read_to_string(path.as_ref()).await?;
        let mut config: ServerConfig = toml::from_str(&contents)?;
        config.file = Some(path.as_ref().canonicalize()?);
        Ok(config)
    }

    /// Set the server bind address.
    pub fn set_bind_address(&mut self, addr: SocketAddr) {
        self.net.bind = addr;
    }

    /// Server bind address.
    pub fn bind_address(&self) -> &SocketAddr {
        &self.net.bind
    }

    /// Path to the database file resolved against the directory
    /// containing the configuration file.
    pub fn database_path(&self) -> PathBuf {
        let path = &self.storage.path;
        if path.is_relative() {
            if let Some(dir) =
                self.file.as_ref().and_then(|file| file.parent())
            {
                return dir.join(path);
            }
        }
        path.to_owned()
    }
}
