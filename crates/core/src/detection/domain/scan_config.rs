use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::shared::constants::{BASE_SCALE, SCALE_INCREMENT, STEP_FRACTION};

#[derive(Error, Debug)]
pub enum ScanConfigError {
    #[error("base scale must be positive, got {0}")]
    BaseScale(f64),
    #[error("scale increment must be greater than 1, got {0}")]
    ScaleIncrement(f64),
    #[error("step fraction must be positive, got {0}")]
    StepFraction(f64),
    #[error("thread count must be at least 1")]
    Threads,
    #[error("failed to read scan config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scan config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Sliding-window scan parameters.
///
/// Missing fields in a JSON config fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// First scale tried, relative to the cascade's base window.
    pub base_scale: f64,
    /// Factor applied between scales.
    pub scale_increment: f64,
    /// Window step as a fraction of the scaled base width.
    pub step_fraction: f64,
    /// Worker threads for the scan; 1 scans on the calling thread.
    pub threads: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_scale: BASE_SCALE,
            scale_increment: SCALE_INCREMENT,
            step_fraction: STEP_FRACTION,
            threads: 1,
        }
    }
}

impl ScanConfig {
    pub fn with_threads(self, threads: usize) -> Self {
        Self { threads, ..self }
    }

    pub fn validate(&self) -> Result<(), ScanConfigError> {
        if !(self.base_scale > 0.0) {
            return Err(ScanConfigError::BaseScale(self.base_scale));
        }
        if !(self.scale_increment > 1.0) {
            return Err(ScanConfigError::ScaleIncrement(self.scale_increment));
        }
        if !(self.step_fraction > 0.0) {
            return Err(ScanConfigError::StepFraction(self.step_fraction));
        }
        if self.threads == 0 {
            return Err(ScanConfigError::Threads);
        }
        Ok(())
    }

    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ScanConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ScanConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: ScanConfig =
            serde_json::from_str(&text).map_err(|e| ScanConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_relative_eq!(config.base_scale, 2.0);
        assert_relative_eq!(config.scale_increment, 1.25);
        assert_relative_eq!(config.step_fraction, 0.1);
        assert_eq!(config.threads, 1);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::zero_base(ScanConfig { base_scale: 0.0, ..ScanConfig::default() })]
    #[case::nan_base(ScanConfig { base_scale: f64::NAN, ..ScanConfig::default() })]
    #[case::unit_increment(ScanConfig { scale_increment: 1.0, ..ScanConfig::default() })]
    #[case::negative_step(ScanConfig { step_fraction: -0.1, ..ScanConfig::default() })]
    #[case::no_threads(ScanConfig::default().with_threads(0))]
    fn test_validate_rejects(#[case] config: ScanConfig) {
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, r#"{ "threads": 4, "step_fraction": 0.05 }"#).unwrap();

        let config = ScanConfig::from_json_file(&path).unwrap();
        assert_eq!(config.threads, 4);
        assert_relative_eq!(config.step_fraction, 0.05);
        assert_relative_eq!(config.base_scale, 2.0);
    }

    #[test]
    fn test_json_with_invalid_values_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, r#"{ "scale_increment": 0.5 }"#).unwrap();

        let err = ScanConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ScanConfigError::ScaleIncrement(_)));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, "{ threads: ").unwrap();

        let err = ScanConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ScanConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = ScanConfig::from_json_file(Path::new("/nonexistent/scan.json")).unwrap_err();
        assert!(matches!(err, ScanConfigError::Read { .. }));
    }
}
