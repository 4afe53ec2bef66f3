use serde::Deserialize;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

fn default_max_rows() -> usize {
    100_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Upper bound on data rows accepted per upload; checked after parsing.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_file_size: default_max_file_size(),
            max_rows: default_max_rows(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            bind_addr: env_or("SHEET_CHARTS_ADDR", defaults.bind_addr)?,
            max_file_size: env_or("MAX_FILE_SIZE", defaults.max_file_size)?,
            max_rows: env_or("MAX_ROWS", defaults.max_rows)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

pub fn load_config() -> Result<Config> {
    // Load .env file first
    dotenv().ok();

    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.max_rows, 100_000);
    }

    #[test]
    fn env_or_falls_back_when_unset() {
        let value: usize = env_or("SHEET_CHARTS_TEST_UNSET_KEY", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn env_or_rejects_garbage() {
        std::env::set_var("SHEET_CHARTS_TEST_BAD_ROWS", "lots");
        let result: Result<usize> = env_or("SHEET_CHARTS_TEST_BAD_ROWS", 1);
        assert!(result.is_err());
        std::env::remove_var("SHEET_CHARTS_TEST_BAD_ROWS");
    }
}
