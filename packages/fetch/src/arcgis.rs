//! `ArcGIS` `FeatureServer` / `MapServer` geometry source.
//!
//! Sends one GET per batch to the layer's `query` endpoint with
//! `f=geojson`. If the service reports `exceededTransferLimit`, the
//! remaining features of the same batch are requested with
//! `resultOffset`.

use async_trait::async_trait;
use geojson::FeatureCollection;

use crate::{FetchError, GeometrySource, QueryParams};

/// A feature service query endpoint.
#[derive(Debug, Clone)]
pub struct ArcgisSource {
    client: reqwest::Client,
    endpoint: String,
}

impl ArcgisSource {
    /// Creates a source for `endpoint` (up to `.../query`).
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Returns the query endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GeometrySource for ArcgisSource {
    async fn fetch(&self, params: &QueryParams) -> Result<FeatureCollection, FetchError> {
        let mut collection: Option<FeatureCollection> = None;
        let mut offset = 0usize;

        loop {
            let mut page_params = params.clone();
            if offset > 0 {
                page_params.insert("resultOffset", offset.to_string());
            }

            let resp = self
                .client
                .get(&self.endpoint)
                .query(&page_params.pairs())
                .send()
                .await?;
            log::debug!("GET {}", resp.url());

            if !resp.status().is_success() {
                return Err(FetchError::Status {
                    status: resp.status().as_u16(),
                    url: resp.url().to_string(),
                });
            }
            let body = resp.text().await?;
            let json: serde_json::Value = serde_json::from_str(&body)?;

            let page = parse_page(json)?;
            let page_len = page.collection.features.len();

            let done = !page.exceeded_transfer_limit || page_len == 0;
            match collection.as_mut() {
                Some(all) => all.features.extend(page.collection.features),
                None => collection = Some(page.collection),
            }

            if done {
                break;
            }
            offset += page_len;
            log::info!("{offset} features so far, fetching next page...");
        }

        collection.ok_or_else(|| FetchError::Conversion {
            message: "No page was parsed".to_string(),
        })
    }
}

/// One parsed response page.
#[derive(Debug)]
pub struct Page {
    /// Features on this page.
    pub collection: FeatureCollection,
    /// Whether the service truncated the result set.
    pub exceeded_transfer_limit: bool,
}

/// Parses a query response body into a [`Page`].
///
/// `exceededTransferLimit` is read from the top level (Esri JSON) or
/// from the top-level `properties` object (`GeoJSON` output).
///
/// # Errors
///
/// Returns [`FetchError::Api`] for the service error envelope and
/// [`FetchError::Conversion`] if the body is not a `FeatureCollection`.
pub fn parse_page(json: serde_json::Value) -> Result<Page, FetchError> {
    // {"error": {"code": 400, "message": "..."}}
    if let Some(error) = json.get("error") {
        return Err(FetchError::Api {
            code: error
                .get("code")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0),
            message: error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    let exceeded_transfer_limit = json
        .get("exceededTransferLimit")
        .or_else(|| json.get("properties")?.get("exceededTransferLimit"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    let collection: FeatureCollection =
        serde_json::from_value(json).map_err(|e| FetchError::Conversion {
            message: format!("Response is not a FeatureCollection: {e}"),
        })?;

    Ok(Page {
        collection,
        exceeded_transfer_limit,
    })
}
