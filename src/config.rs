use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use um_policy::{PolicyThresholds, THRESHOLD_DISCARD, THRESHOLD_RESULT_DISTANCE};
use um_vision::THRESHOLD_CONTROL;

/// Tuned against the bundled marker and item assets. Recalibrate when those change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Highest accepted anchor marker score
    pub control: f64,
    /// Highest accepted best template score
    pub discard: f64,
    /// Minimum gap between the best two results
    pub result_distance: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            control: THRESHOLD_CONTROL,
            discard: THRESHOLD_DISCARD,
            result_distance: THRESHOLD_RESULT_DISTANCE,
        }
    }
}

impl Thresholds {
    pub fn policy(&self) -> PolicyThresholds {
        PolicyThresholds {
            discard: self.discard,
            result_distance: self.result_distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Holds items.csv, items/, sockets/ and templates/
    pub data_dir: PathBuf,
    pub tesseract_cmd: PathBuf,
    /// Process screenshots that aren't 1920x1080 (with a warning)
    pub allow_non_full_hd: bool,
    /// Trust an item name read from an identified title
    pub find_item_by_name: bool,
    pub ignore_non_global_items: bool,
    /// Fail on unknown item names instead of falling back to matching
    pub find_by_name_raise: bool,
    pub thresholds: Thresholds,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tesseract_cmd: PathBuf::from("tesseract"),
            allow_non_full_hd: true,
            find_item_by_name: true,
            ignore_non_global_items: true,
            find_by_name_raise: false,
            thresholds: Thresholds::default(),
        }
    }
}

impl MatcherConfig {
    /// Load a JSON config file. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("No config found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MatcherConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, MatcherConfig::default());
        assert!(config.allow_non_full_hd);
        assert_eq!(config.thresholds.control, 0.16);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"allow_non_full_hd": false, "thresholds": {"discard": 0.5}}"#,
        )
        .unwrap();

        let config = MatcherConfig::load(&path).unwrap();
        assert!(!config.allow_non_full_hd);
        assert!(config.find_item_by_name);
        assert_eq!(config.thresholds.discard, 0.5);
        assert_eq!(config.thresholds.result_distance, 0.02);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(MatcherConfig::load(&path).is_err());
    }

    #[test]
    fn test_policy_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.policy(), PolicyThresholds::default());
    }
}
