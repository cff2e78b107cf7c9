//! Configuration resolution for the MTL gateway.
//!
//! Settings are resolved in layers, lowest priority first:
//! 1. Built-in defaults
//! 2. Settings file (explicit path, or `~/.config/mtl/gateway.json`)
//! 3. `MTL_*` environment variables
//! 4. CLI arguments (applied by the binary)
//!
//! Secrets such as the JWT signing key are never read from the settings
//! file; they come from the environment or the command line only.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Complete gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub services: ServiceEndpoints,
    pub relay: RelayConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listen address, e.g. `0.0.0.0:8080`.
    pub addr: String,
    /// Upper bound for a single unary backend call, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Static addresses of the backend gRPC services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceEndpoints {
    pub user: String,
    pub configuration: String,
    pub agent: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            user: "http://127.0.0.1:50051".to_string(),
            configuration: "http://127.0.0.1:50052".to_string(),
            agent: "http://127.0.0.1:50053".to_string(),
        }
    }
}

/// Agent relay session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    /// Hard deadline for one relay session. Default: 2 hours.
    pub session_timeout_secs: u64,
    /// Capacity of the channel feeding the backend request stream.
    pub backend_buffer: usize,
    /// Upper bound on teardown: best-effort client sends and letting the
    /// agent stream flush a final CLOSE.
    pub teardown_grace_millis: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: 2 * 60 * 60,
            backend_buffer: 128,
            teardown_grace_millis: 2000,
        }
    }
}

/// Load configuration with layered resolution.
///
/// An explicit `path` must exist. Without one, the global settings file is
/// used when present.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => match global_config_path() {
            Some(global) if global.exists() => load_config_file(&global)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global settings file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mtl").join("gateway.json"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `MTL_*` overrides. `lookup` abstracts the environment so the
/// precedence rules can be tested without mutating process state.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("MTL_GATEWAY_ADDR") {
        config.gateway.addr = val;
    }
    if let Some(n) = lookup("MTL_REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.gateway.request_timeout_secs = n;
    }
    if let Some(val) = lookup("MTL_USER_ADDR") {
        config.services.user = val;
    }
    if let Some(val) = lookup("MTL_CONFIGURATION_ADDR") {
        config.services.configuration = val;
    }
    if let Some(val) = lookup("MTL_AGENT_ADDR") {
        config.services.agent = val;
    }
    if let Some(n) = lookup("MTL_SESSION_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.relay.session_timeout_secs = n;
    }
    if let Some(n) = lookup("MTL_TEARDOWN_GRACE_MS").and_then(|v| v.parse().ok()) {
        config.relay.teardown_grace_millis = n;
    }
}
