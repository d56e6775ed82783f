//! Server configuration
//!
//! Every setting is a command line flag that can also be supplied through a
//! `TRISTORE_*` environment variable:
//!
//! - `TRISTORE_HOST` / `--host`: listen address (default `127.0.0.1`)
//! - `TRISTORE_PORT` / `--port`: listen port (default `9666`)
//! - `TRISTORE_BACKEND` / `--backend`: `sqlite` or `memory` (default `sqlite`)
//! - `TRISTORE_DB` / `--db`: SQLite file (default `<data dir>/tristore/tristore.db`)
//! - `TRISTORE_GRAPHS` / `--graphs`: comma separated graphs created at startup
//! - `TRISTORE_TIMEOUT_SECS` / `--timeout-secs`: per request deadline, 0 disables
//! - `TRISTORE_BATCH_SIZE` / `--batch-size`: triples per bulk insert transaction

use crate::storage::{MemoryStore, OpenStore, SqliteStore, StorageError, TripleStore, DEFAULT_BATCH_SIZE};
use clap::{Args, ValueEnum};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error returned when configuration is unusable
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },

    #[error("no database path given and no data directory could be determined")]
    NoDatabasePath,

    #[error("failed to open storage: {0}")]
    Storage(#[from] StorageError),
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendKind {
    #[default]
    Sqlite,
    Memory,
}

/// Server configuration
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "TRISTORE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "TRISTORE_PORT", default_value_t = ServerConfig::DEFAULT_PORT)]
    pub port: u16,

    /// Storage backend
    #[arg(long, env = "TRISTORE_BACKEND", value_enum, default_value_t = BackendKind::Sqlite)]
    pub backend: BackendKind,

    /// Path to SQLite database file
    #[arg(long, env = "TRISTORE_DB")]
    pub db: Option<PathBuf>,

    /// Graphs to create at startup (comma separated)
    #[arg(long, env = "TRISTORE_GRAPHS", value_delimiter = ',')]
    pub graphs: Vec<String>,

    /// Per request deadline in seconds (0 = none)
    #[arg(long, env = "TRISTORE_TIMEOUT_SECS", default_value_t = ServerConfig::DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Triples inserted per bulk transaction
    #[arg(long, env = "TRISTORE_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: Self::DEFAULT_PORT,
            backend: BackendKind::default(),
            db: None,
            graphs: Vec::new(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 9666;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// In-memory configuration, handy for tests and demos.
    pub fn in_memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Zero means no deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured path, or `<data dir>/tristore/tristore.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(db) = &self.db {
            return Ok(db.clone());
        }
        let data_dir = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
            .ok_or(ConfigError::NoDatabasePath)?;
        Ok(data_dir.join("tristore").join("tristore.db"))
    }

    /// Names of graphs to create at startup, trimmed.
    pub fn startup_graphs(&self) -> Vec<String> {
        self.graphs
            .iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect()
    }

    /// Check cross-field constraints clap cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "batch_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                name: "port",
                message: "must be 1-65535".to_string(),
            });
        }
        if self.graphs.iter().any(|g| g.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                name: "graphs",
                message: "graph names must not be empty".to_string(),
            });
        }
        if self.backend == BackendKind::Sqlite {
            self.database_path()?;
        }
        Ok(())
    }

    /// Open the configured backend.
    pub fn open_store(&self) -> Result<Arc<dyn TripleStore>, ConfigError> {
        self.validate()?;
        let store: Arc<dyn TripleStore> = match self.backend {
            BackendKind::Memory => Arc::new(MemoryStore::new()),
            BackendKind::Sqlite => {
                let path = self.database_path()?;
                Arc::new(SqliteStore::open(&path)?.with_batch_size(self.batch_size))
            }
        };
        Ok(store)
    }
}
