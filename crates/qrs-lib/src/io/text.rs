use crate::{error::ParseError, signal::Sample};
use std::path::Path;

/// Parse newline-delimited unsigned samples, ignoring blank/comment lines.
pub fn parse_sample_series(text: &str) -> Result<Vec<Sample>, ParseError> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: Sample = trimmed.parse().map_err(|_| ParseError::InvalidSample {
            line: idx + 1,
            text: trimmed.to_string(),
        })?;
        out.push(val);
    }
    if out.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(out)
}

/// Read a newline-delimited sample series from disk.
pub fn read_sample_series(path: &Path) -> Result<Vec<Sample>, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_sample_series(&text)
}

/// Render samples one per line.
pub fn format_sample_series(samples: &[Sample]) -> String {
    let mut out = String::with_capacity(samples.len() * 4);
    for sample in samples {
        out.push_str(&sample.to_string());
        out.push('\n');
    }
    out
}
