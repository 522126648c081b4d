//! Server configuration
//!
//! A YAML file provides the base configuration (missing file means defaults)
//! and command-line flags override individual fields.

use clap::Parser;
use provenant_detectors::DetectorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

const MIB: usize = 1024 * 1024;

/// Command-line arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "provenant-server")]
#[command(about = "Provenant AI-generated content detection service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PROVENANT_CONFIG", default_value = "provenant.yaml")]
    pub config: String,

    /// Listen address
    #[arg(short = 'l', long, env = "PROVENANT_LISTEN")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "PROVENANT_PORT")]
    pub port: Option<u16>,

    /// Skip loading the pretrained text model
    #[arg(long)]
    pub no_model: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Allowed CORS origins; a `*.` host prefix matches any subdomain
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Detector and capability settings
    #[serde(default)]
    pub detectors: DetectorConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = if Path::new(&cli.config).exists() {
            let content = std::fs::read_to_string(&cli.config)?;
            Self::from_yaml(&content)?
        } else {
            tracing::info!(path = %cli.config, "Config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(cli);
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| anyhow::anyhow!("Failed to parse server config: {}", e))
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            self.port = port;
        }

        if cli.no_model {
            self.detectors.text_model.enabled = false;
        }
    }

    /// Human-readable upload cap used in rejection messages
    pub fn upload_limit_label(&self) -> String {
        if self.max_upload_bytes >= MIB && self.max_upload_bytes % MIB == 0 {
            format!("{}MB", self.max_upload_bytes / MIB)
        } else {
            format!("{} bytes", self.max_upload_bytes)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_origins: default_cors_origins(),
            detectors: DetectorConfig::default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    100 * MIB
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "https://*.vercel.app".to_string(),
    ]
}
