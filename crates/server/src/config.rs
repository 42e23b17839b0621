use std::{path::PathBuf, time::Duration};

use clap::Parser;
use deployment::DeploymentConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "hanja-server", version, about = "Hanja lookup API")]
pub struct ServerConfig {
    #[arg(long, env = "HANJA_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "HANJA_PORT", default_value_t = 3001)]
    pub port: u16,

    /// Directory holding `hanja_database.json` and `new-structure/`.
    #[arg(long, env = "HANJA_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding `images/hanja/<char>.svg`.
    #[arg(long, env = "HANJA_PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    /// Stroke data base URLs, tried in order. Comma separated.
    #[arg(long = "stroke-cdn", env = "HANJA_STROKE_CDN", value_delimiter = ',')]
    pub stroke_cdn: Vec<String>,

    #[arg(long, env = "HANJA_STROKE_TIMEOUT_SECS", default_value_t = 10)]
    pub stroke_timeout_secs: u64,

    /// TOML file extending the grade to legacy level mapping.
    #[arg(long, env = "HANJA_LEGACY_MAPPING")]
    pub legacy_mapping: Option<PathBuf>,

    /// Filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn deployment_config(&self) -> DeploymentConfig {
        let mut config = DeploymentConfig::new(&self.data_dir, &self.public_dir);
        if !self.stroke_cdn.is_empty() {
            config.stroke_sources = self.stroke_cdn.clone();
        }
        config.stroke_timeout = Duration::from_secs(self.stroke_timeout_secs);
        config.legacy_mapping = self.legacy_mapping.clone();
        config
    }
}
