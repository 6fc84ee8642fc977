//! Per-region value tables.
//!
//! A table maps region identifiers to an optional numeric value, where
//! `None` means "no data". Tables load from a JSON object or from a CSV
//! file with a code column and a score column.

use std::collections::BTreeMap;
use std::path::Path;

use crate::LayerError;

/// Default CSV column holding region identifiers.
pub const DEFAULT_CODE_COLUMN: &str = "Geo_code";

/// Default CSV column holding values.
pub const DEFAULT_SCORE_COLUMN: &str = "Score";

/// Immutable mapping from region identifier to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    values: BTreeMap<String, Option<f64>>,
}

impl ValueTable {
    /// Builds a table from `(id, value)` pairs.
    ///
    /// Non-finite values are stored as "no data".
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::DuplicateRegion`] if an identifier repeats.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, Option<f64>)>,
    ) -> Result<Self, LayerError> {
        let mut values = BTreeMap::new();
        for (id, value) in entries {
            let value = value.filter(|v| {
                let finite = v.is_finite();
                if !finite {
                    log::warn!("Region {id}: non-finite value {v} treated as no data");
                }
                finite
            });
            if values.insert(id.clone(), value).is_some() {
                return Err(LayerError::DuplicateRegion { id });
            }
        }
        Ok(Self { values })
    }

    /// Parses a JSON object such as `{"E01008881": 2, "E01008882": null}`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Json`] if the document is not an object of
    /// numbers or nulls.
    pub fn from_json_str(json: &str) -> Result<Self, LayerError> {
        let parsed: BTreeMap<String, Option<f64>> = serde_json::from_str(json)?;
        Self::from_entries(parsed)
    }

    /// Reads a CSV document with a header row.
    ///
    /// Empty score cells are "no data".
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if a column is missing, a score is not a
    /// number, or an identifier repeats.
    pub fn from_csv_reader<R: std::io::Read>(
        reader: R,
        code_column: &str,
        score_column: &str,
    ) -> Result<Self, LayerError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| LayerError::Conversion {
                    message: format!("CSV has no '{name}' column"),
                })
        };
        let code_idx = position(code_column)?;
        let score_idx = position(score_column)?;

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result?;
            let id = record.get(code_idx).unwrap_or("").trim();
            if id.is_empty() {
                continue;
            }
            let score = record.get(score_idx).unwrap_or("").trim();
            let value = if score.is_empty() {
                None
            } else {
                Some(score.parse::<f64>().map_err(|e| LayerError::Conversion {
                    message: format!("Region {id}: invalid score '{score}': {e}"),
                })?)
            };
            entries.push((id.to_string(), value));
        }

        Self::from_entries(entries)
    }

    /// Loads a table from disk, choosing the format by extension
    /// (`.csv`, anything else is read as JSON).
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the file cannot be read or parsed.
    pub fn load(path: &Path, code_column: &str, score_column: &str) -> Result<Self, LayerError> {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let table = if is_csv {
            let file = std::fs::File::open(path)?;
            Self::from_csv_reader(file, code_column, score_column)?
        } else {
            Self::from_json_str(&std::fs::read_to_string(path)?)?
        };

        log::info!(
            "Loaded {} regions ({} with values) from {}",
            table.len(),
            table.values().count(),
            path.display()
        );
        Ok(table)
    }

    /// Returns the defined value for `id`, or `None` if the region is
    /// absent or has no data.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied().flatten()
    }

    /// Returns `true` if `id` is present, with or without a value.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    /// Returns every identifier in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Iterates over `(id, value)` for regions with a defined value.
    pub fn defined(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values
            .iter()
            .filter_map(|(id, v)| v.map(|v| (id.as_str(), v)))
    }

    /// Iterates over defined values.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.values().filter_map(|v| *v)
    }

    /// Returns the number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the table has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_with_nulls() {
        let table = ValueTable::from_json_str(r#"{"A": 1, "B": 5.5, "C": null}"#).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("A"), Some(1.0));
        assert_eq!(table.get("B"), Some(5.5));
        assert_eq!(table.get("C"), None);
        assert!(table.contains("C"));
        assert!(!table.contains("D"));
        assert_eq!(table.values().count(), 2);
    }

    #[test]
    fn rejects_json_strings() {
        assert!(ValueTable::from_json_str(r#"{"A": "high"}"#).is_err());
    }

    #[test]
    fn parses_csv_with_named_columns() {
        let csv = "Name,Geo_code,Score\nAlpha,A,1\nBeta,B,\nGamma, C ,10\n";
        let table =
            ValueTable::from_csv_reader(csv.as_bytes(), DEFAULT_CODE_COLUMN, DEFAULT_SCORE_COLUMN)
                .unwrap();
        assert_eq!(table.ids(), vec!["A", "B", "C"]);
        assert_eq!(table.get("B"), None);
        assert_eq!(table.get("C"), Some(10.0));
    }

    #[test]
    fn csv_missing_column_is_an_error() {
        let csv = "code,value\nA,1\n";
        let err = ValueTable::from_csv_reader(csv.as_bytes(), "Geo_code", "Score").unwrap_err();
        assert!(matches!(err, LayerError::Conversion { .. }));
    }

    #[test]
    fn csv_duplicate_region_is_an_error() {
        let csv = "Geo_code,Score\nA,1\nA,2\n";
        let err = ValueTable::from_csv_reader(csv.as_bytes(), "Geo_code", "Score").unwrap_err();
        assert!(matches!(err, LayerError::DuplicateRegion { id } if id == "A"));
    }

    #[test]
    fn non_finite_values_become_no_data() {
        let table =
            ValueTable::from_entries([("A".to_string(), Some(f64::NAN))]).unwrap();
        assert!(table.contains("A"));
        assert_eq!(table.get("A"), None);
    }

    #[test]
    fn ids_are_sorted() {
        let table = ValueTable::from_json_str(r#"{"C": 1, "A": 2, "B": 3}"#).unwrap();
        assert_eq!(table.ids(), vec!["A", "B", "C"]);
    }
}
