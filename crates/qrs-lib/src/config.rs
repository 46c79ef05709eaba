use crate::{detectors::beat::InitialPhase, detectors::qrs::DetectorConfig, error::ConfigError};
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr};

/// How emitted beats are written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One raw phase byte per beat, as sent over the serial line.
    #[default]
    Symbols,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "symbols" => Ok(OutputFormat::Symbols),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(ConfigError::UnknownVariant {
                kind: "output format",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for InitialPhase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" => Ok(InitialPhase::Unknown),
            "qrs" => Ok(InitialPhase::Qrs),
            "t" => Ok(InitialPhase::T),
            _ => Err(ConfigError::UnknownVariant {
                kind: "initial phase",
                value: s.to_string(),
            }),
        }
    }
}

/// Settings file for the command-line tools.
///
/// ```toml
/// sample_rate_hz = 200.0
/// output = "json"
///
/// [detector]
/// initial_phase = "unknown"
/// warmup_holdoff = 400
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    /// Only used for pacing streamed input and reporting heart rate.
    pub sample_rate_hz: f64,
    pub output: OutputFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            sample_rate_hz: 200.0,
            output: OutputFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(ConfigError::SampleRate(self.sample_rate_hz));
        }
        Ok(())
    }
}
