//! Grid configuration - engine settings and templates loaded from TOML.
//!
//! ```toml
//! [settings]
//! spacing = 24.0
//! smooth_scrolling = true
//! seed = 7
//!
//! [[templates]]
//! rows = ["X_X_", "_X_X"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::grid::GridTemplate;
use crate::state::DEFAULT_SMOOTH_FACTOR;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSettings {
    /// Gap between cells, and below each page
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Space above the first forward page
    #[serde(default)]
    pub leading_offset: f64,
    /// Exponential easing constant for wheel scrolling
    #[serde(default = "default_smooth_factor")]
    pub smooth_factor: f64,
    /// Ease wheel scrolling (false snaps to every position)
    #[serde(default = "default_true")]
    pub smooth_scrolling: bool,
    /// Seed for template selection, random when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            spacing: default_spacing(),
            leading_offset: 0.0,
            smooth_factor: default_smooth_factor(),
            smooth_scrolling: default_true(),
            seed: None,
        }
    }
}

/// One template in text form, a string per row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub settings: GridSettings,
    #[serde(default)]
    pub templates: Vec<TemplateDef>,
}

fn default_spacing() -> f64 {
    24.0
}

fn default_smooth_factor() -> f64 {
    DEFAULT_SMOOTH_FACTOR
}

fn default_true() -> bool {
    true
}

impl GridConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Build every template, failing on the first invalid one.
    pub fn templates(&self) -> Result<Vec<GridTemplate>> {
        self.templates
            .iter()
            .map(|def| GridTemplate::parse(def.rows.as_slice()))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        let settings = &self.settings;
        if !settings.spacing.is_finite() || settings.spacing < 0.0 {
            return Err(GridError::Config(format!(
                "spacing must be a non-negative number, got {}",
                settings.spacing
            )));
        }
        if !settings.leading_offset.is_finite() {
            return Err(GridError::Config("leading_offset must be finite".into()));
        }
        if !(settings.smooth_factor > 0.0 && settings.smooth_factor <= 1.0) {
            return Err(GridError::Config(format!(
                "smooth_factor must be in (0, 1], got {}",
                settings.smooth_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellKind;

    #[test]
    fn test_defaults_when_empty() {
        let config = GridConfig::from_toml_str("").unwrap();
        assert_eq!(config.settings.spacing, 24.0);
        assert_eq!(config.settings.leading_offset, 0.0);
        assert_eq!(config.settings.smooth_factor, 0.05);
        assert!(config.settings.smooth_scrolling);
        assert_eq!(config.settings.seed, None);
        assert!(config.templates.is_empty());
    }

    #[test]
    fn test_parse_settings_and_templates() {
        let config = GridConfig::from_toml_str(
            r#"
            [settings]
            spacing = 12.0
            leading_offset = 80.0
            smooth_scrolling = false
            seed = 9

            [[templates]]
            rows = ["X_", "_X"]

            [[templates]]
            rows = ["XXX"]
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.spacing, 12.0);
        assert_eq!(config.settings.leading_offset, 80.0);
        assert!(!config.settings.smooth_scrolling);
        assert_eq!(config.settings.seed, Some(9));

        let templates = config.templates().unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].kind_at(0, 0), Some(CellKind::Content));
        assert_eq!(templates[1].cols(), 3);
    }

    #[test]
    fn test_invalid_template_fails_eagerly() {
        let config = GridConfig::from_toml_str(
            r#"
            [[templates]]
            rows = ["X_", "_X_"]
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.templates(),
            Err(GridError::RaggedRow { row: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert!(matches!(
            GridConfig::from_toml_str("[settings]\nspacing = -1.0"),
            Err(GridError::Config(_))
        ));
        assert!(matches!(
            GridConfig::from_toml_str("[settings]\nsmooth_factor = 0.0"),
            Err(GridError::Config(_))
        ));
        assert!(matches!(
            GridConfig::from_toml_str("[settings]\nspacing = \"wide\""),
            Err(GridError::Toml(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            GridConfig::load("/nonexistent/daybreak-grid.toml"),
            Err(GridError::Io(_))
        ));
    }
}
