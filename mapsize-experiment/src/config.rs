use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Presentation constants for one session. The trial structure itself is fixed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub reference_size_px: u32,
    /// Presented sizes are drawn from `reference ± jitter`, inclusive.
    pub size_jitter_px: u32,
    pub max_trials: usize,
    pub flash_ms: u64,
    pub reference_ms: u64,
    pub bigger_key: char,
    pub smaller_key: char,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            reference_size_px: 300,
            size_jitter_px: 50,
            max_trials: 5,
            flash_ms: 300,
            reference_ms: 100,
            bigger_key: 'b',
            smaller_key: 's',
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses and validates. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_trials == 0 {
            return Err(ConfigError::Invalid("max_trials must be at least 1".into()));
        }
        if self.size_jitter_px >= self.reference_size_px {
            return Err(ConfigError::Invalid(format!(
                "size_jitter_px ({}) must be smaller than reference_size_px ({})",
                self.size_jitter_px, self.reference_size_px
            )));
        }
        if self.reference_size_px.checked_add(self.size_jitter_px).is_none() {
            return Err(ConfigError::Invalid(format!(
                "reference_size_px + size_jitter_px ({} + {}) exceeds {}",
                self.reference_size_px,
                self.size_jitter_px,
                u32::MAX
            )));
        }
        if self.bigger_key.to_lowercase().eq(self.smaller_key.to_lowercase()) {
            return Err(ConfigError::Invalid(format!(
                "bigger_key and smaller_key are both '{}'",
                self.bigger_key
            )));
        }
        Ok(())
    }

    pub fn size_range(&self) -> RangeInclusive<u32> {
        (self.reference_size_px - self.size_jitter_px)..=(self.reference_size_px + self.size_jitter_px)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }

    pub fn reference_duration(&self) -> Duration {
        Duration::from_millis(self.reference_ms)
    }

    pub fn export_file_name(&self) -> String {
        format!(
            "experiment-data-image-size-{}px.csv",
            self.reference_size_px
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_standard_session() {
        let config = ExperimentConfig::default();
        assert_eq!(config.size_range(), 250..=350);
        assert_eq!(config.max_trials, 5);
        assert_eq!(config.flash_duration(), Duration::from_millis(300));
        assert_eq!(config.reference_duration(), Duration::from_millis(100));
        assert_eq!(
            config.export_file_name(),
            "experiment-data-image-size-300px.csv"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ExperimentConfig::from_json(r#"{ "flash_ms": 500, "bigger_key": "j" }"#)
            .unwrap();
        assert_eq!(config.flash_ms, 500);
        assert_eq!(config.bigger_key, 'j');
        assert_eq!(config.reference_size_px, 300);
    }

    #[test]
    fn rejects_zero_trials() {
        let err = ExperimentConfig::from_json(r#"{ "max_trials": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_jitter_at_or_above_reference() {
        let err = ExperimentConfig::from_json(r#"{ "reference_size_px": 40, "size_jitter_px": 40 }"#)
            .unwrap_err();
        assert!(err.to_string().contains("size_jitter_px"));
    }

    #[test]
    fn rejects_range_overflow() {
        let err = ExperimentConfig::from_json(
            r#"{ "reference_size_px": 4000000000, "size_jitter_px": 400000000 }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("exceeds"));

        let edge = ExperimentConfig {
            reference_size_px: u32::MAX - 10,
            size_jitter_px: 10,
            ..ExperimentConfig::default()
        };
        assert!(edge.validate().is_ok());
        assert_eq!(edge.size_range(), (u32::MAX - 20)..=u32::MAX);
    }

    #[test]
    fn rejects_same_key_for_both_answers() {
        let err = ExperimentConfig::from_json(r#"{ "bigger_key": "S" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ExperimentConfig::from_json("{ max_trials: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_trials": 3 }}"#).unwrap();
        let config = ExperimentConfig::load(file.path()).unwrap();
        assert_eq!(config.max_trials, 3);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ExperimentConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
