#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Choropleth configuration, style, and value types.
//!
//! Defines the TOML schema for a choropleth rendering pass (remote
//! endpoint, join column, query defaults, palette, and style constants)
//! and the per-feature [`StyleDescriptor`] produced by the styler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of region identifiers per remote query.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Errors raised while validating a [`ChoroplethConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value the pipeline cannot work with.
    #[error("Invalid config field '{field}': {message}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Description of what is wrong with it.
        message: String,
    },
}

/// A complete choropleth rendering configuration, deserialized from TOML.
///
/// Replaces module-level constants: every pipeline entry point takes one
/// of these explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoroplethConfig {
    /// Unique configuration identifier (e.g., `"birmingham_imd"`).
    pub id: String,
    /// Human-readable name (e.g., "Birmingham LSOA IMD deciles").
    pub name: String,
    /// Feature-service query URL (up to `.../query`).
    pub endpoint: String,
    /// Attribute holding the region identifier, used both in the `IN`
    /// filter and to read the identifier back from returned features.
    pub join_column: String,
    /// Maximum identifiers per remote query.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Color-scale stops as CSS color strings. One output color is
    /// interpolated per class.
    pub palette: Vec<String>,
    /// Fixed output-control query parameters.
    #[serde(default)]
    pub query: QueryDefaults,
    /// Style constants.
    #[serde(default)]
    pub style: StyleConfig,
}

impl ChoroplethConfig {
    /// Returns the configuration identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable configuration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks that the configuration can drive a rendering pass.
    ///
    /// Palette colors are parsed later by the classifier; only the
    /// presence of at least one stop is checked here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(invalid("endpoint", "must not be empty"));
        }
        if self.join_column.trim().is_empty() {
            return Err(invalid("join_column", "must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "must be greater than zero"));
        }
        if self.palette.is_empty() {
            return Err(invalid("palette", "must contain at least one color"));
        }
        self.style.validate()
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

const fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Output-control parameters merged into every remote query.
///
/// Rendered as `outFields`, `outSR`, `f`, and `geometryPrecision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Attribute fields to return with each feature.
    #[serde(default)]
    pub out_fields: Vec<String>,
    /// Spatial reference code for returned geometry.
    #[serde(default = "default_out_sr")]
    pub out_sr: String,
    /// Output format selector.
    #[serde(default = "default_format")]
    pub format: String,
    /// Number of decimal digits kept in returned coordinates.
    #[serde(default = "default_geometry_precision")]
    pub geometry_precision: u8,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            out_fields: Vec::new(),
            out_sr: default_out_sr(),
            format: default_format(),
            geometry_precision: default_geometry_precision(),
        }
    }
}

fn default_out_sr() -> String {
    "4326".to_string()
}

fn default_format() -> String {
    "geojson".to_string()
}

const fn default_geometry_precision() -> u8 {
    5
}

/// Predicate selecting values that receive the warning style.
///
/// The default, [`WarningRule::AbsBelowZero`], tests `|value| < 0` and
/// therefore never matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningRule {
    /// `|value| < 0`. Never true for any number.
    #[default]
    AbsBelowZero,
    /// `value < 0`.
    Negative,
    /// `value == 0`.
    Zero,
    /// Warning style disabled.
    Never,
}

impl WarningRule {
    /// Returns `true` if `value` should be drawn with the warning style.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn matches(self, value: f64) -> bool {
        match self {
            Self::AbsBelowZero => value.abs() < 0.0,
            Self::Negative => value < 0.0,
            Self::Zero => value == 0.0,
            Self::Never => false,
        }
    }
}

/// Fixed style constants shared by all features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Outline color for every feature.
    pub stroke_color: String,
    /// Outline width for every feature.
    pub stroke_weight: f64,
    /// Fill for regions with no value.
    pub no_data_fill: String,
    /// Opacity for regions with no value.
    pub no_data_opacity: f64,
    /// Fill for values matched by [`Self::warning_rule`].
    pub warning_fill: String,
    /// Opacity for values matched by [`Self::warning_rule`].
    pub warning_opacity: f64,
    /// Opacity for classified values.
    pub class_opacity: f64,
    /// Fill for values above the highest breakpoint.
    pub out_of_range_fill: String,
    /// Which values get the warning style.
    pub warning_rule: WarningRule,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            stroke_color: "black".to_string(),
            stroke_weight: 0.1,
            no_data_fill: "#cccccc".to_string(),
            no_data_opacity: 1.0,
            warning_fill: "#ffbe33".to_string(),
            warning_opacity: 1.0 / 12.0,
            class_opacity: 1.0 / 3.0,
            out_of_range_fill: "#555555".to_string(),
            warning_rule: WarningRule::default(),
        }
    }
}

impl StyleConfig {
    /// Checks opacities are usable and mutually distinguishable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any opacity is outside
    /// `[0, 1]`, a value-bearing opacity is zero, or the no-data opacity
    /// collides with a value-bearing one.
    #[allow(clippy::float_cmp)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, opacity) in [
            ("style.no_data_opacity", self.no_data_opacity),
            ("style.warning_opacity", self.warning_opacity),
            ("style.class_opacity", self.class_opacity),
        ] {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(invalid(field, format!("{opacity} is outside [0, 1]")));
            }
        }
        if self.class_opacity == 0.0 {
            return Err(invalid("style.class_opacity", "must be nonzero"));
        }
        if self.warning_opacity == 0.0 {
            return Err(invalid("style.warning_opacity", "must be nonzero"));
        }
        if self.no_data_opacity == self.class_opacity
            || self.no_data_opacity == self.warning_opacity
        {
            return Err(invalid(
                "style.no_data_opacity",
                "must differ from class and warning opacities",
            ));
        }
        if self.stroke_weight < 0.0 {
            return Err(invalid("style.stroke_weight", "must not be negative"));
        }
        Ok(())
    }
}

/// Visual attributes computed for one feature at draw time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    /// Outline color.
    pub stroke_color: String,
    /// Outline width.
    pub stroke_weight: f64,
    /// Fill color as a CSS color string.
    pub fill_color: String,
    /// Fill opacity in `[0, 1]`.
    pub fill_opacity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
        id = "test"
        name = "Test"
        endpoint = "https://example.com/FeatureServer/0/query"
        join_column = "LSOA11CD"
        palette = ["#d01c8b", "#f1b6da", "#b8e186", "#4dac26"]
    "##;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: ChoroplethConfig = toml::de::from_str(MINIMAL).unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.query.out_sr, "4326");
        assert_eq!(config.query.format, "geojson");
        assert_eq!(config.query.geometry_precision, 5);
        assert_eq!(config.style.warning_rule, WarningRule::AbsBelowZero);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_warning_rule_override() {
        let toml_str = format!("{MINIMAL}\n[style]\nwarning_rule = \"negative\"\n");
        let config: ChoroplethConfig = toml::de::from_str(&toml_str).unwrap();
        assert_eq!(config.style.warning_rule, WarningRule::Negative);
        assert_eq!(config.style.no_data_fill, "#cccccc");
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut config: ChoroplethConfig = toml::de::from_str(MINIMAL).unwrap();
        config.batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "batch_size",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_palette() {
        let mut config: ChoroplethConfig = toml::de::from_str(MINIMAL).unwrap();
        config.palette.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_indistinguishable_no_data_opacity() {
        let style = StyleConfig {
            no_data_opacity: 1.0 / 3.0,
            ..StyleConfig::default()
        };
        assert!(style.validate().is_err());
    }

    #[test]
    fn abs_below_zero_never_matches() {
        for value in [-10.0, -0.5, 0.0, 0.5, 10.0, f64::MIN, f64::MAX] {
            assert!(!WarningRule::AbsBelowZero.matches(value));
        }
    }

    #[test]
    fn negative_and_zero_rules() {
        assert!(WarningRule::Negative.matches(-0.1));
        assert!(!WarningRule::Negative.matches(0.0));
        assert!(WarningRule::Zero.matches(0.0));
        assert!(!WarningRule::Zero.matches(1.0));
        assert!(!WarningRule::Never.matches(-1.0));
    }
}
