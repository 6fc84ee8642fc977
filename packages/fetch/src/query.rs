//! Attribute-filter query construction.
//!
//! Each batch becomes a `where` predicate of the form
//! `COLUMN IN ('a','b','c')`, merged over the fixed output-control
//! parameters. Identifiers are quoted verbatim: an identifier containing
//! `'` produces a malformed predicate.

use std::collections::BTreeMap;

use choropleth_map_models::QueryDefaults;

/// Parameter key holding the attribute filter.
pub const WHERE_KEY: &str = "where";

/// URL query parameters for one remote request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, String>,
}

impl QueryParams {
    /// Sets `key` to `value`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the attribute filter, if set.
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.get(WHERE_KEY)
    }

    /// Returns the parameters as `(key, value)` pairs in key order, ready
    /// for [`reqwest::RequestBuilder::query`].
    #[must_use]
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Builds the `IN` predicate selecting every identifier in `batch`.
#[must_use]
pub fn build_filter<S: AsRef<str>>(join_column: &str, batch: &[S]) -> String {
    let quoted = batch
        .iter()
        .map(|id| format!("'{}'", id.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    format!("{join_column} IN ({quoted})")
}

/// Merges the batch filter over the fixed output-control parameters.
///
/// When `defaults.out_fields` is empty only the join column is
/// requested, since the styler needs it to identify each feature.
#[must_use]
pub fn build_query<S: AsRef<str>>(
    defaults: &QueryDefaults,
    join_column: &str,
    batch: &[S],
) -> QueryParams {
    let mut params = QueryParams::default();

    let out_fields = if defaults.out_fields.is_empty() {
        join_column.to_string()
    } else {
        defaults.out_fields.join(",")
    };
    params.insert("outFields", out_fields);
    params.insert("outSR", defaults.out_sr.clone());
    params.insert("f", defaults.format.clone());
    params.insert(
        "geometryPrecision",
        defaults.geometry_precision.to_string(),
    );
    params.insert(WHERE_KEY, build_filter(join_column, batch));

    params
}
