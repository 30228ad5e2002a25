use std::path::Path;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use kafkaviz_engine::SimConfig;
use kafkaviz_tutor::TutorConfig;

use crate::error::ServerError;

pub const DEFAULT_CONFIG_PATH: &str = "kafkaviz.toml";

#[derive(Parser)]
#[command(name = "kafkaviz-server", about = "Interactive Kafka playground")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the simulation behind the HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, env = "KAFKAVIZ_CONFIG")]
    pub config: String,

    /// Overrides `api_port` from the config file
    #[arg(long)]
    pub port: Option<u16>,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(flatten)]
    pub simulation: SimConfig,

    #[serde(default)]
    pub tutor: TutorConfig,
}

fn default_api_port() -> u16 {
    9200
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            simulation: SimConfig::default(),
            tutor: TutorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read and validate `path`. A missing file at the default location
    /// yields the built-in playground.
    pub fn load(path: &str) -> Result<Self, ServerError> {
        if path == DEFAULT_CONFIG_PATH && !Path::new(path).exists() {
            tracing::info!(config = %path, "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ServerError::Config {
            context: "read",
            detail: format!("'{path}': {e}"),
        })?;
        Self::parse(&content).map_err(|e| match e {
            ServerError::Config { context, detail } => ServerError::Config {
                context,
                detail: format!("'{path}': {detail}"),
            },
            other => other,
        })
    }

    pub fn parse(toml_str: &str) -> Result<Self, ServerError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ServerError::Config {
            context: "parse",
            detail: e.to_string(),
        })?;
        config
            .simulation
            .validate()
            .map_err(|e| ServerError::Config {
                context: "validate",
                detail: e.to_string(),
            })?;
        Ok(config)
    }
}
