#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batched feature-service geometry queries.
//!
//! Region identifiers are split into bounded batches ([`batch`]), each
//! batch becomes one attribute-filter query ([`query`]), and a
//! [`GeometrySource`] resolves each query to a `GeoJSON`
//! `FeatureCollection`. The bundled source is the `ArcGIS` REST query
//! endpoint ([`arcgis`]).

pub mod arcgis;
pub mod batch;
pub mod query;

use async_trait::async_trait;
use geojson::FeatureCollection;
use thiserror::Error;

pub use arcgis::ArcgisSource;
pub use batch::partition;
pub use query::{QueryParams, build_filter, build_query};

/// Errors that can occur while fetching geometry.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The service returned its JSON error envelope.
    #[error("Feature service error {code}: {message}")]
    Api {
        /// Service error code.
        code: i64,
        /// Service error message.
        message: String,
    },

    /// The response is not a usable `FeatureCollection`.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// A remote source of region geometry.
///
/// One call corresponds to one batch query. Implementations must not
/// retry; failures are reported per batch by the caller.
#[async_trait]
pub trait GeometrySource: Send + Sync {
    /// Resolves one query to the features it selects.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails or the response is not
    /// a `GeoJSON` `FeatureCollection`.
    async fn fetch(&self, params: &QueryParams) -> Result<FeatureCollection, FetchError>;
}
