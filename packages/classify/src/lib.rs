#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Quantile classification and color palettes for choropleth maps.
//!
//! [`Breakpoints`] partitions a value set into quantile classes,
//! [`Palette`] interpolates one color per class from a list of CSS color
//! stops, and [`Classifier`] pairs the two so any value can be mapped to
//! a class color.

pub mod breakpoints;
pub mod colors;

use serde::Serialize;
use thiserror::Error;

pub use breakpoints::{Breakpoints, Classification};
pub use colors::Palette;

/// Errors that can occur while building a classifier.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// A palette stop is not a valid CSS color.
    #[error("Invalid color '{color}': {message}")]
    InvalidColor {
        /// The unparseable input.
        color: String,
        /// Parser error message.
        message: String,
    },

    /// No palette stops were supplied.
    #[error("Palette must contain at least one color")]
    EmptyPalette,
}

/// One legend row: the value range of a class and its color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    /// Exclusive lower bound, or `None` for the lowest class.
    pub lower: Option<f64>,
    /// Inclusive upper bound.
    pub upper: f64,
    /// Class fill color (`#rrggbb`).
    pub color: String,
}

/// Maps values to palette colors via quantile breakpoints.
///
/// Built once per rendering pass from the full set of defined values.
/// The palette always has exactly one color per class.
#[derive(Debug, Clone)]
pub struct Classifier {
    breakpoints: Breakpoints,
    palette: Palette,
}

impl Classifier {
    /// Computes quantile breakpoints over `values` and interpolates one
    /// color per class from `stops`.
    ///
    /// The class count equals the number of stops.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] if `stops` is empty or holds an invalid
    /// color.
    pub fn new<S: AsRef<str>>(
        values: impl IntoIterator<Item = f64>,
        stops: &[S],
    ) -> Result<Self, ClassifyError> {
        let palette = Palette::generate(stops, stops.len())?;
        let breakpoints = Breakpoints::quantile(values, palette.len());
        log::debug!(
            "Classifier: {} classes, breakpoints {:?}",
            palette.len(),
            breakpoints.as_slice()
        );
        Ok(Self {
            breakpoints,
            palette,
        })
    }

    /// Returns the computed breakpoints.
    #[must_use]
    pub const fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    /// Returns the class palette.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Classifies `value` against the breakpoints.
    #[must_use]
    pub fn classify(&self, value: f64) -> Classification {
        self.breakpoints.classify(value)
    }

    /// Returns the color for `value`, or `None` if it is out of range.
    #[must_use]
    pub fn color_for(&self, value: f64) -> Option<&str> {
        match self.classify(value) {
            Classification::Class(index) => self.palette.color(index),
            Classification::OutOfRange => None,
        }
    }

    /// Returns one legend entry per class.
    #[must_use]
    pub fn legend(&self) -> Vec<LegendEntry> {
        let limits = self.breakpoints.as_slice();
        limits
            .iter()
            .enumerate()
            .filter_map(|(i, &upper)| {
                let color = self.palette.color(i)?.to_string();
                let lower = i.checked_sub(1).map(|prev| limits[prev]);
                Some(LegendEntry {
                    lower,
                    upper,
                    color,
                })
            })
            .collect()
    }
}
