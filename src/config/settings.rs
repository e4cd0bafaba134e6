//! Runtime settings read from the environment.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Where queries run: against local tenant files, or delegated to the control plane's query endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    Local,
    Remote,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ExecutionMode::Local),
            "remote" => Ok(ExecutionMode::Remote),
            _ => Err(format!("{} (expected local or remote)", s)),
        }
    }
}

/// Limits for the per-tenant pool registry.
#[derive(Clone, Debug)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub max_tenants: usize,
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            max_connections: 4,
            max_tenants: 64,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub bind_addr: String,
    pub control_plane_url: String,
    pub configs_path: String,
    pub query_path: String,
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    pub execution_mode: ExecutionMode,
    pub pool: PoolSettings,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind_addr: "0.0.0.0:8080".into(),
            control_plane_url: "http://localhost:8000".into(),
            configs_path: "/api-configs".into(),
            query_path: "/query".into(),
            data_dir: PathBuf::from("data"),
            poll_interval: Duration::from_secs(10),
            execution_mode: ExecutionMode::Local,
            pool: PoolSettings::default(),
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Settings {
    /// Read settings from process environment; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Settings::default();
        Ok(Settings {
            bind_addr: lookup("BIND_ADDR").unwrap_or(d.bind_addr),
            control_plane_url: lookup("CONTROL_PLANE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(d.control_plane_url),
            configs_path: lookup("CONFIGS_PATH").unwrap_or(d.configs_path),
            query_path: lookup("QUERY_PATH").unwrap_or(d.query_path),
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(d.data_dir),
            poll_interval: parse_secs(&lookup, "POLL_INTERVAL_SECS", d.poll_interval)?,
            execution_mode: parse_var(&lookup, "EXECUTION_MODE", d.execution_mode)?,
            pool: PoolSettings {
                max_connections: parse_var(&lookup, "TENANT_POOL_MAX_CONNECTIONS", d.pool.max_connections)?,
                max_tenants: parse_var(&lookup, "TENANT_POOL_MAX_TENANTS", d.pool.max_tenants)?,
                idle_timeout: parse_secs(&lookup, "TENANT_POOL_IDLE_SECS", d.pool.idle_timeout)?,
            },
            request_timeout: parse_secs(&lookup, "REQUEST_TIMEOUT_SECS", d.request_timeout)?,
            max_body_bytes: parse_var(&lookup, "MAX_BODY_BYTES", d.max_body_bytes)?,
        })
    }

    pub fn configs_url(&self) -> String {
        format!("{}{}", self.control_plane_url, self.configs_path)
    }

    pub fn query_url(&self) -> String {
        format!("{}{}", self.control_plane_url, self.query_path)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Setting {
            name,
            reason: e.to_string(),
        }),
    }
}

fn parse_secs<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_var(lookup, name, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Setting {
            name,
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
