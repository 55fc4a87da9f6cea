use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::catalog::{FetchPolicy, CELESTRAK_GP_URL};
use crate::predict::{GroundStation, DEFAULT_INTERVAL_MINUTES, MAX_HORIZON_HOURS, MAX_SAMPLES};
use crate::service::FallbackPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub fallback: FallbackPolicy,
    pub prediction: PredictionConfig,
    pub station: Option<StationConfig>,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    #[serde(deserialize_with = "human_duration")]
    pub timeout: Duration,
    pub max_retries: u32,
    #[serde(deserialize_with = "human_duration")]
    pub backoff: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let policy = FetchPolicy::default();
        Self {
            base_url: CELESTRAK_GP_URL.to_string(),
            timeout: policy.timeout,
            max_retries: policy.max_retries,
            backoff: policy.backoff,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(deserialize_with = "human_duration")]
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    #[serde(deserialize_with = "human_duration")]
    pub interval: Duration,
    pub default_hours: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs((DEFAULT_INTERVAL_MINUTES * 60.0) as u64),
            default_hours: 24.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

const MIN_PREDICTION_INTERVAL: Duration = Duration::from_secs(1);

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl.is_zero() {
            return Err(ConfigError::Invalid("cache.ttl must be positive".into()));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid("cache.capacity must be positive".into()));
        }
        if self.catalog.timeout.is_zero() {
            return Err(ConfigError::Invalid("catalog.timeout must be positive".into()));
        }
        if self.prediction.interval < MIN_PREDICTION_INTERVAL {
            return Err(ConfigError::Invalid(format!(
                "prediction.interval must be at least {}",
                humantime::format_duration(MIN_PREDICTION_INTERVAL)
            )));
        }
        let hours = self.prediction.default_hours;
        if !(hours > 0.0 && hours <= MAX_HORIZON_HOURS) {
            return Err(ConfigError::Invalid(format!(
                "prediction.default_hours must be in (0, {}], got {}",
                MAX_HORIZON_HOURS, hours
            )));
        }
        let samples = (hours * 3600.0 / self.prediction.interval.as_secs_f64()) as i64 + 1;
        if samples > MAX_SAMPLES {
            return Err(ConfigError::Invalid(format!(
                "prediction.interval too fine for {} h ({} samples, at most {})",
                hours, samples, MAX_SAMPLES
            )));
        }
        self.station()?;
        Ok(())
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: self.catalog.timeout,
            max_retries: self.catalog.max_retries,
            backoff: self.catalog.backoff,
        }
    }

    pub fn station(&self) -> Result<Option<GroundStation>, ConfigError> {
        let Some(station) = &self.station else {
            return Ok(None);
        };
        GroundStation::from_coordinates(&station.coordinates, Some(station.altitude_m))
            .map(Some)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "station.coordinates must be \"lat, lon\" in degrees, got {:?}",
                    station.coordinates
                ))
            })
    }

    pub fn prediction_interval(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::from_std(self.prediction.interval)
            .map_err(|e| ConfigError::Invalid(format!("prediction.interval: {}", e)))
    }
}
