//! Layered configuration for the Scout prediction service.
//!
//! Configuration is loaded in layers with increasing priority:
//! 1. Compiled-in defaults (listen on `0.0.0.0:5001`, bundled model path)
//! 2. TOML configuration file (if provided)
//! 3. Environment variable overrides (prefix `SCOUT_`, nested with `__`)

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

// ── Default value functions ────────────────────────────────────────────

/// Default listen address: all interfaces.
fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default listen port: 5001.
fn default_port() -> u16 {
    5001
}

/// Default graceful shutdown window: 5 000 ms.
fn default_shutdown_grace_ms() -> u64 {
    5_000
}

/// Default model manifest location, relative to the working directory.
fn default_manifest_path() -> PathBuf {
    PathBuf::from("model/position_model.json")
}

// ── Configuration structs ──────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Trained artifact location.
    pub model: ModelConfig,
    /// Log output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long in-flight requests may take to drain after a shutdown signal.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

/// Trained artifact configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the JSON manifest describing scaler, classifier and labels.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Load configuration using layered sources.
    ///
    /// 1. Compiled-in defaults.
    /// 2. TOML file at `config_path` (if `Some`).
    /// 3. Environment variable overrides with prefix `SCOUT_` and `__` as
    ///    the nesting separator (e.g., `SCOUT_SERVER__PORT=8080`).
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder()
            // ── Layer 1: compiled-in defaults ───────────────────────
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("server.shutdown_grace_ms", default_shutdown_grace_ms() as i64)?
            .set_default(
                "model.manifest_path",
                default_manifest_path().to_string_lossy().into_owned(),
            )?
            .set_default("logging.json", false)?;

        // ── Layer 2: TOML file ─────────────────────────────────────
        if let Some(path) = config_path {
            let path_str = path
                .to_str()
                .context("config path is not valid UTF-8")?;
            builder = builder.add_source(File::with_name(path_str).required(true));
        }

        // ── Layer 3: env var overrides (SCOUT_ prefix) ─────────────
        // The prefix separator has to be `_` explicitly; otherwise the
        // `config` crate reuses the `__` nesting separator for the prefix.
        builder = builder.add_source(
            Environment::with_prefix("SCOUT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: AppConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Socket address string the server should bind, e.g. `0.0.0.0:5001`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.server.host.trim().is_empty() {
            bail!("server.host must not be empty");
        }
        if self.model.manifest_path.as_os_str().is_empty() {
            bail!("model.manifest_path must not be empty");
        }
        Ok(())
    }
}
