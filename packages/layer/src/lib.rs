#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Choropleth layer assembly.
//!
//! Joins a [`ValueTable`] of per-region values to polygon geometry fetched
//! in batches from a feature service, styles each feature by its quantile
//! class, and merges the results into a [`LayerHandle`] as each batch
//! resolves. [`LayerAssembler::load`] hands back the live layer
//! immediately together with a [`LoadCompletion`] that resolves to a
//! per-batch [`LoadReport`].

pub mod assemble;
pub mod layer;
pub mod registry;
pub mod report;
pub mod style;
pub mod values;

use thiserror::Error;

pub use assemble::{LayerAssembler, LayerLoad, LoadCompletion};
pub use layer::{GeoJsonMap, LayerHandle, MapContext, MapLayer, StyledFeature};
pub use report::{BatchOutcome, BatchStatus, LoadReport};
pub use style::{FeatureStyler, StyleOutcome};
pub use values::ValueTable;

/// Errors that can occur while preparing or loading a layer.
#[derive(Debug, Error)]
pub enum LayerError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] choropleth_map_models::ConfigError),

    /// Classifier or palette could not be built.
    #[error(transparent)]
    Classify(#[from] choropleth_map_classify::ClassifyError),

    /// File read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML config could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A region identifier appears more than once in the value table.
    #[error("Duplicate region identifier: {id}")]
    DuplicateRegion {
        /// The repeated identifier.
        id: String,
    },

    /// No embedded preset has the requested identifier.
    #[error("Unknown preset: {id}")]
    UnknownPreset {
        /// The requested identifier.
        id: String,
    },

    /// `load` was called outside a tokio runtime.
    #[error("Layer loading requires a running tokio runtime")]
    NoRuntime,

    /// Input data could not be interpreted.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
