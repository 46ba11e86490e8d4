use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub crypto: CryptoConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string, or the literal "memory" for the
    /// in-process store (demo runs without a database server).
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct CryptoConfig {
    /// "simulated" or "keyed".
    pub backend: String,
    /// base64, 32 bytes; required by the keyed backend.
    pub master_key: Option<String>,
    /// base64, 32 bytes; required by the keyed backend.
    pub signing_key: Option<String>,
    #[serde(default = "default_reference_length")]
    pub reference_length: usize,
}

fn default_reference_length() -> usize {
    12
}

#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    /// Seed demo flights and seats on startup when the catalog is empty.
    #[serde(default)]
    pub seed: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of AERIS)
            // Eg.. `AERIS__SERVER__PORT=8080` would set the server port
            .add_source(config::Environment::with_prefix("AERIS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
