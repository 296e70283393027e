//! Application configuration, read from an optional TOML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seed for the adjustment/noise source. `None` draws from entropy.
    pub seed: Option<u64>,
    pub artifacts: ArtifactPaths,
    pub time: TimeConfig,
    pub forecast: ForecastConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub input_scaler: PathBuf,
    pub output_scaler: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("artifacts/pm25_pinn.bin"),
            input_scaler: PathBuf::from("artifacts/scaler_x.bin"),
            output_scaler: PathBuf::from("artifacts/scaler_y.bin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Offset used to turn the entered wall-clock time into epoch seconds.
    pub utc_offset_seconds: i32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        // Asia/Bangkok, where the place table lives.
        Self {
            utc_offset_seconds: 7 * 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseModel {
    /// Daily mean of raw samples plus one Uniform(-1, 1) draw.
    #[default]
    Flat,
    /// Diurnal adjustment on every intra-day sample, no extra noise.
    Diurnal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub days: u32,
    pub sample_hours: Vec<u32>,
    pub noise: NoiseModel,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            days: 30,
            sample_hours: vec![0, 6, 12, 18],
            noise: NoiseModel::Flat,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub chart: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            chart: Some(PathBuf::from("pm25_forecast.png")),
            csv: None,
        }
    }
}

impl AppConfig {
    /// Reads `path` when given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast.days == 0 {
            return Err(ConfigError::Invalid("forecast.days must be at least 1".into()));
        }
        if self.forecast.sample_hours.is_empty() {
            return Err(ConfigError::Invalid(
                "forecast.sample_hours must not be empty".into(),
            ));
        }
        if let Some(hour) = self.forecast.sample_hours.iter().find(|&&h| h >= 24) {
            return Err(ConfigError::Invalid(format!(
                "forecast.sample_hours contains {hour}, hours must be below 24"
            )));
        }
        if self.time.utc_offset_seconds.abs() >= 86_400 {
            return Err(ConfigError::Invalid(format!(
                "time.utc_offset_seconds {} is not within one day",
                self.time.utc_offset_seconds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.forecast.days, 30);
        assert_eq!(config.forecast.sample_hours, vec![0, 6, 12, 18]);
        assert_eq!(config.forecast.noise, NoiseModel::Flat);
        assert_eq!(config.time.utc_offset_seconds, 25_200);
        assert!(config.seed.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            seed = 7

            [forecast]
            noise = "diurnal"
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.forecast.noise, NoiseModel::Diurnal);
        assert_eq!(config.forecast.days, 30);
        assert_eq!(config.artifacts, ArtifactPaths::default());
    }

    #[test]
    fn out_of_range_hour_is_rejected() {
        let err = AppConfig::from_toml("[forecast]\nsample_hours = [0, 24]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_noise_model_is_a_parse_error() {
        let err = AppConfig::from_toml("[forecast]\nnoise = \"gaussian\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
