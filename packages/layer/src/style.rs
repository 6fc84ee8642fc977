//! Per-feature styling.
//!
//! [`FeatureStyler`] holds the value table, the classifier built from it,
//! and the style constants. Styling is a pure function of the feature's
//! region identifier.

use std::sync::Arc;

use choropleth_map_classify::{Classification, Classifier};
use choropleth_map_models::{ChoroplethConfig, StyleConfig, StyleDescriptor};
use serde::Serialize;

use crate::{LayerError, ValueTable};

/// Which styling branch a feature fell into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleOutcome {
    /// Region absent from the table, or present without a value.
    NoData,
    /// Value matched the configured warning rule.
    Warning {
        /// The region's value.
        value: f64,
    },
    /// Value fell into a quantile class.
    Classed {
        /// The region's value.
        value: f64,
        /// Class index into the palette.
        class: usize,
    },
    /// Value exceeded every breakpoint.
    OutOfRange {
        /// The region's value.
        value: f64,
    },
}

impl StyleOutcome {
    /// Returns the joined value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::NoData => None,
            Self::Warning { value }
            | Self::Classed { value, .. }
            | Self::OutOfRange { value } => Some(*value),
        }
    }
}

/// Computes style descriptors from region identifiers.
#[derive(Debug, Clone)]
pub struct FeatureStyler {
    table: Arc<ValueTable>,
    classifier: Classifier,
    style: StyleConfig,
}

impl FeatureStyler {
    /// Creates a styler from explicit parts.
    #[must_use]
    pub const fn new(table: Arc<ValueTable>, classifier: Classifier, style: StyleConfig) -> Self {
        Self {
            table,
            classifier,
            style,
        }
    }

    /// Builds the classifier from every defined value in `table` and the
    /// configured palette.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Classify`] if the palette is empty or holds
    /// an invalid color.
    pub fn from_config(table: Arc<ValueTable>, config: &ChoroplethConfig) -> Result<Self, LayerError> {
        let classifier = Classifier::new(table.values(), config.palette.as_slice())?;
        Ok(Self::new(table, classifier, config.style.clone()))
    }

    /// Returns the value table.
    #[must_use]
    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    /// Returns the classifier.
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Decides which styling branch applies to `id`.
    #[must_use]
    pub fn outcome(&self, id: Option<&str>) -> StyleOutcome {
        let Some(value) = id.and_then(|id| self.table.get(id)) else {
            return StyleOutcome::NoData;
        };

        if self.style.warning_rule.matches(value) {
            return StyleOutcome::Warning { value };
        }

        match self.classifier.classify(value) {
            Classification::Class(class) => StyleOutcome::Classed { value, class },
            Classification::OutOfRange => StyleOutcome::OutOfRange { value },
        }
    }

    /// Maps a styling branch to its descriptor.
    #[must_use]
    pub fn describe(&self, outcome: StyleOutcome) -> StyleDescriptor {
        let (fill_color, fill_opacity) = match outcome {
            StyleOutcome::NoData => (self.style.no_data_fill.clone(), self.style.no_data_opacity),
            StyleOutcome::Warning { .. } => {
                (self.style.warning_fill.clone(), self.style.warning_opacity)
            }
            StyleOutcome::Classed { class, .. } => (
                self.classifier
                    .palette()
                    .color(class)
                    .unwrap_or(&self.style.out_of_range_fill)
                    .to_string(),
                self.style.class_opacity,
            ),
            StyleOutcome::OutOfRange { .. } => (
                self.style.out_of_range_fill.clone(),
                self.style.class_opacity,
            ),
        };

        StyleDescriptor {
            stroke_color: self.style.stroke_color.clone(),
            stroke_weight: self.style.stroke_weight,
            fill_color,
            fill_opacity,
        }
    }

    /// Styles the feature identified by `id`.
    #[must_use]
    pub fn style(&self, id: Option<&str>) -> StyleDescriptor {
        self.describe(self.outcome(id))
    }
}
