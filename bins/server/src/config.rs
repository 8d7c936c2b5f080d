use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

pub use record_store::StorageConfig;

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "relay-server", about = "Delayed echo and aggregating recorder")]
pub struct Cli {
    /// Число worker-потоков runtime (по умолчанию: по числу ядер)
    #[arg(long, global = true, env = "WORKERS")]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Echo: подождать `delay` мс и вернуть имя обработавшего потока
    Echo(EchoArgs),
    /// Aggregator: два вызова echo, конкатенация, сохранение записи
    Aggregate(AggregateArgs),
}

impl Commands {
    /// Prefix for runtime worker thread names.
    pub fn service_name(&self) -> &'static str {
        match self {
            Commands::Echo(_) => "echo",
            Commands::Aggregate(_) => "aggregator",
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct EchoArgs {
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    #[arg(long, default_value_t = 8081, env = "PORT")]
    pub port: u16,
}

#[derive(Args, Clone, Debug, Default)]
pub struct AggregateArgs {
    /// Путь к TOML конфиг файлу
    #[arg(long, env = "CONFIG_PATH")]
    pub config: Option<String>,

    /// Base URL of the echo service, e.g. `http://localhost:8081/`
    #[arg(long, env = "ECHO_URL")]
    pub echo_url: Option<String>,

    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Таймаут одного запроса к echo, мс
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Store records in this JSONL file instead of memory
    #[arg(long, env = "STORAGE_FILE")]
    pub storage_file: Option<PathBuf>,
}

// ---- TOML Config ----

#[derive(Debug, Default, Deserialize)]
pub struct AggregatorFileConfig {
    pub echo_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AggregatorFileConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        toml::from_str(&content)
            .map_err(|e| ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_aggregator_port() -> u16 {
    8080
}
fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Итоговый конфиг агрегатора: CLI/env поверх TOML поверх defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    pub host: String,
    pub port: u16,
    pub echo_url: String,
    pub request_timeout: Duration,
    pub storage: StorageConfig,
}

impl AggregatorConfig {
    pub fn resolve(args: &AggregateArgs) -> Result<Self, ServerError> {
        let file = match &args.config {
            Some(path) => AggregatorFileConfig::load(path)?,
            None => AggregatorFileConfig::default(),
        };
        Self::merge(args, file)
    }

    fn merge(args: &AggregateArgs, file: AggregatorFileConfig) -> Result<Self, ServerError> {
        let echo_url = args
            .echo_url
            .clone()
            .or(file.echo_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ServerError::Config {
                context: "echo_url",
                detail: "set --echo-url, ECHO_URL or `echo_url` in the config file".to_string(),
            })?;

        let timeout_ms = args
            .request_timeout_ms
            .or(file.request_timeout_ms)
            .unwrap_or_else(default_request_timeout_ms);
        if timeout_ms == 0 {
            return Err(ServerError::Config {
                context: "request_timeout_ms",
                detail: "must be greater than zero".to_string(),
            });
        }

        let storage = match &args.storage_file {
            Some(path) => StorageConfig::File { path: path.clone() },
            None => file.storage,
        };

        Ok(Self {
            host: args.host.clone().or(file.host).unwrap_or_else(default_host),
            port: args.port.or(file.port).unwrap_or_else(default_aggregator_port),
            echo_url,
            request_timeout: Duration::from_millis(timeout_ms),
            storage,
        })
    }
}
