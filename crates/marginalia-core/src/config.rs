use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MarginaliaError, Result};
use crate::models::ClippingType;
use crate::normalize::normalize_title;

/// Default Jaccard similarity at which two highlights count as fuzzy duplicates.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Root application configuration, loaded from `~/.config/marginalia/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub processing: ProcessOptions,
}

/// What the merger does with two overlapping highlights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Fuse the pair into one highlight.
    #[default]
    Merge,
    /// Keep both and flag the shorter one as `overlapping`.
    Flag,
}

/// Options for one pipeline run. Passed by reference into every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    pub remove_duplicates: bool,
    pub merge_overlapping: bool,
    pub merge_mode: MergeMode,
    pub merge_notes: bool,
    pub extract_tags: bool,
    pub highlights_only: bool,
    pub fuzzy_threshold: f64,
    pub filter: FilterOptions,
}

/// Which clippings enter the pipeline at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// When non-empty, only these books are kept (title match ignores case and punctuation).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub only_books: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_books: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_types: Vec<ClippingType>,
    /// Minimum trimmed length for highlights and notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_content_length: Option<usize>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            merge_overlapping: true,
            merge_mode: MergeMode::Merge,
            merge_notes: true,
            extract_tags: false,
            highlights_only: false,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            filter: FilterOptions::default(),
        }
    }
}

impl ProcessOptions {
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// Reject settings a config file should not contain.
    ///
    /// Thresholds passed in code are clamped instead, see
    /// [`effective_fuzzy_threshold`](Self::effective_fuzzy_threshold).
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(MarginaliaError::Config(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if let Some(book) = self
            .filter
            .only_books
            .iter()
            .find(|book| {
                let key = normalize_title(book);
                self.filter.exclude_books.iter().any(|other| normalize_title(other) == key)
            })
        {
            return Err(MarginaliaError::Config(format!(
                "book {book:?} is both included and excluded"
            )));
        }
        Ok(())
    }

    /// Threshold clamped into `[0, 1]`; NaN falls back to the default.
    pub fn effective_fuzzy_threshold(&self) -> f64 {
        if self.fuzzy_threshold.is_nan() {
            DEFAULT_FUZZY_THRESHOLD
        } else {
            self.fuzzy_threshold.clamp(0.0, 1.0)
        }
    }
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.only_books.is_empty()
            && self.exclude_books.is_empty()
            && self.exclude_types.is_empty()
            && self.min_content_length.is_none()
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/marginalia/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("MARGINALIA_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("marginalia")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path and validate its processing options.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.processing.validate().map_err(|err| match err {
            MarginaliaError::Config(msg) => {
                MarginaliaError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_options() {
        let opts = ProcessOptions::default();
        assert!(opts.remove_duplicates);
        assert!(opts.merge_overlapping);
        assert!(opts.merge_notes);
        assert_eq!(opts.merge_mode, MergeMode::Merge);
        assert_eq!(opts.fuzzy_threshold, 0.8);
        assert!(opts.filter.is_empty());
    }

    #[test]
    fn test_threshold_is_clamped() {
        assert_eq!(ProcessOptions::default().with_fuzzy_threshold(1.7).effective_fuzzy_threshold(), 1.0);
        assert_eq!(ProcessOptions::default().with_fuzzy_threshold(-2.0).effective_fuzzy_threshold(), 0.0);
        assert_eq!(
            ProcessOptions::default().with_fuzzy_threshold(f64::NAN).effective_fuzzy_threshold(),
            DEFAULT_FUZZY_THRESHOLD
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [processing]
            merge_mode = "flag"
            fuzzy_threshold = 0.9

            [processing.filter]
            exclude_types = ["bookmark"]
            "#,
        )
        .unwrap();
        assert_eq!(config.processing.merge_mode, MergeMode::Flag);
        assert_eq!(config.processing.fuzzy_threshold, 0.9);
        assert!(config.processing.remove_duplicates);
        assert_eq!(config.processing.filter.exclude_types, vec![ClippingType::Bookmark]);
    }

    #[test]
    fn test_load_missing_returns_default() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.processing, ProcessOptions::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.processing.extract_tags = true;
        config.processing.filter.only_books = vec!["Dune".to_string()];
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert!(loaded.processing.extract_tags);
        assert_eq!(loaded.processing.filter.only_books, vec!["Dune".to_string()]);
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[processing]\nfuzzy_threshold = 1.5\n").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, MarginaliaError::Config(_)));
        let msg = err.to_string();
        assert!(msg.contains("fuzzy_threshold"));
        assert!(msg.contains("config.toml"));
    }

    #[test]
    fn test_validate_rejects_nan_and_conflicting_books() {
        assert!(ProcessOptions::default().validate().is_ok());
        assert!(ProcessOptions::default().with_fuzzy_threshold(f64::NAN).validate().is_err());

        let mut opts = ProcessOptions::default();
        opts.filter.only_books = vec!["Dune".to_string()];
        opts.filter.exclude_books = vec!["dune".to_string()];
        assert!(matches!(opts.validate(), Err(MarginaliaError::Config(_))));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "processing = 3").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
