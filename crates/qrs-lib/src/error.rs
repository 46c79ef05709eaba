use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("line {line} is not an unsigned 16-bit sample: {text}")]
    InvalidSample { line: usize, text: String },
    #[error("no samples found")]
    Empty,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write event: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode event: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write csv record: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("sample rate must be positive and finite, got {0}")]
    SampleRate(f64),
    #[error("unknown {kind} `{value}`")]
    UnknownVariant { kind: &'static str, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("sample consumer has hung up")]
    Closed,
    #[error("previous sample has not been consumed yet")]
    Overrun,
}
