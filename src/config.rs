//! Configuration loading from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Where outcome records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Sqlite,
    Mock,
}

impl FromStr for DataMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DataMode::Sqlite),
            "mock" => Ok(DataMode::Mock),
            _ => anyhow::bail!("Invalid DATA_MODE: {}. Must be 'sqlite' or 'mock'", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_mode: DataMode,
    pub database_url: String,
    /// Caller-level sample floor for a retrain cycle. The trainer applies
    /// its own hard floor of 20 usable rows independently.
    pub min_samples: usize,
    pub interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let data_mode = env::var("DATA_MODE")
            .unwrap_or_else(|_| "sqlite".to_string())
            .parse::<DataMode>()?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/signals.db".to_string());

        let min_samples = env::var("RETRAIN_MIN_SAMPLES")
            .unwrap_or_else(|_| "50".to_string())
            .parse::<usize>()
            .context("Invalid RETRAIN_MIN_SAMPLES")?;

        let interval_secs = env::var("RETRAIN_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()
            .context("Invalid RETRAIN_INTERVAL_SECS")?;

        if interval_secs == 0 {
            anyhow::bail!("RETRAIN_INTERVAL_SECS must be greater than 0");
        }

        Ok(Self {
            data_mode,
            database_url,
            min_samples,
            interval_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_mode_parsing() {
        assert_eq!("sqlite".parse::<DataMode>().unwrap(), DataMode::Sqlite);
        assert_eq!("Mock".parse::<DataMode>().unwrap(), DataMode::Mock);
        assert!("postgres".parse::<DataMode>().is_err());
    }
}
