//! Server configuration: TOML file with CLI overrides

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use walkshed_core::engine::EngineConfig;

#[derive(Parser, Debug)]
#[command(name = "walkshed-server", version, about = "Walking reachability and what-if road analysis over HTTP")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, overrides the configuration file
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Network snapshot to load at startup, overrides the configuration file
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub snapshot: Option<PathBuf>,
    pub request_timeout_secs: u64,
    /// Requests processed at once across all routes
    pub concurrency_limit: usize,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            snapshot: None,
            request_timeout_secs: 30,
            concurrency_limit: 64,
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration file if one is given, defaults otherwise
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config '{}'", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Applies command line overrides on top of the file configuration
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(bind) = cli.bind {
            self.bind = bind;
        }
        if let Some(snapshot) = &cli.snapshot {
            self.snapshot = Some(snapshot.clone());
        }
        self
    }
}
