//! Configuration management for the pagecut server

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::document::{DEFAULT_DPI, POINTS_PER_INCH};
use crate::raster::RasterConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub raster: RasterConfig,
    pub output_dir: Option<PathBuf>,
    pub session_capacity: usize,
    pub render_timeout: Duration,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            raster: RasterConfig {
                dpi: DEFAULT_DPI,
                region_dpi: DEFAULT_DPI,
                points_per_inch: POINTS_PER_INCH,
            },
            output_dir: None,
            session_capacity: 32,
            render_timeout: Duration::from_secs(60),
            max_body_bytes: 100 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Read settings from the environment; unset variables keep defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let dpi = parse_or(&lookup, "PAGECUT_DPI", defaults.raster.dpi)?;
        let region_dpi = parse_or(&lookup, "PAGECUT_REGION_DPI", defaults.raster.region_dpi)?;
        for (key, value) in [("PAGECUT_DPI", dpi), ("PAGECUT_REGION_DPI", region_dpi)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: value.to_string(),
                });
            }
        }

        let timeout_secs = parse_or(
            &lookup,
            "PAGECUT_RENDER_TIMEOUT_SECS",
            defaults.render_timeout.as_secs(),
        )?;
        let max_body_mb = parse_or(
            &lookup,
            "PAGECUT_MAX_BODY_MB",
            defaults.max_body_bytes / (1024 * 1024),
        )?;

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_or(&lookup, "SERVER_PORT", defaults.server.port)?,
            },
            raster: RasterConfig {
                dpi,
                region_dpi,
                points_per_inch: POINTS_PER_INCH,
            },
            output_dir: lookup("PAGECUT_OUTPUT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            session_capacity: parse_or(
                &lookup,
                "PAGECUT_SESSION_CAPACITY",
                defaults.session_capacity,
            )?,
            render_timeout: Duration::from_secs(timeout_secs),
            max_body_bytes: max_body_mb.saturating_mul(1024 * 1024),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
        }),
    }
}
