//! Load completion reports.
//!
//! Every batch settles into exactly one [`BatchOutcome`]. The
//! [`LoadReport`] built from them also lists join diagnostics: regions
//! requested but not returned, values never drawn, and values outside the
//! classifier's range.

use std::collections::BTreeSet;
use std::fmt;

use choropleth_map_fetch::FetchError;

use crate::{MapLayer, StyleOutcome, ValueTable};

/// How one batch settled.
#[derive(Debug)]
pub enum BatchStatus {
    /// The fetch succeeded and its features were merged.
    Loaded {
        /// Number of features merged.
        features: usize,
        /// Requested identifiers with no matching feature in the response.
        missing: Vec<String>,
    },
    /// The fetch failed; none of the batch's features were merged.
    Failed(FetchError),
    /// The batch task panicked or was cancelled before settling.
    Aborted(String),
}

/// The settled state of one batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Position of the batch in dispatch order.
    pub index: usize,
    /// Identifiers requested by the batch.
    pub ids: Vec<String>,
    /// How the batch settled.
    pub status: BatchStatus,
}

impl BatchOutcome {
    /// Builds the outcome of a successful merge from the identifiers
    /// that arrived.
    #[must_use]
    pub fn loaded(index: usize, ids: Vec<String>, arrived: &[Option<String>]) -> Self {
        let features = arrived.len();
        let arrived: BTreeSet<&str> = arrived.iter().filter_map(Option::as_deref).collect();
        let missing = ids
            .iter()
            .filter(|id| !arrived.contains(id.as_str()))
            .cloned()
            .collect();
        Self {
            index,
            ids,
            status: BatchStatus::Loaded { features, missing },
        }
    }

    /// Returns `true` unless the batch loaded.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !matches!(self.status, BatchStatus::Loaded { .. })
    }
}

/// Summary of a finished layer load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Outcomes in dispatch order.
    pub batches: Vec<BatchOutcome>,
    /// Identifiers requested by a loaded batch but absent from its
    /// response.
    pub missing_geometry: Vec<String>,
    /// Identifiers with a defined value that never appeared in the layer.
    pub unmatched_values: Vec<String>,
    /// Identifiers whose value exceeded every breakpoint.
    pub out_of_range: Vec<String>,
    /// Features in the layer when the load finished.
    pub features: usize,
}

impl LoadReport {
    /// Builds the report from settled batches and the final layer.
    #[must_use]
    pub fn new(mut batches: Vec<BatchOutcome>, layer: &MapLayer, table: &ValueTable) -> Self {
        batches.sort_by_key(|b| b.index);

        let missing_geometry = batches
            .iter()
            .filter_map(|b| match &b.status {
                BatchStatus::Loaded { missing, .. } => Some(missing.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect();

        let drawn = layer.ids();
        let unmatched_values = table
            .defined()
            .filter(|(id, _)| !drawn.contains(*id))
            .map(|(id, _)| id.to_string())
            .collect();

        let out_of_range = layer
            .features()
            .iter()
            .filter(|f| matches!(f.outcome, StyleOutcome::OutOfRange { .. }))
            .filter_map(|f| f.id.clone())
            .collect();

        Self {
            batches,
            missing_geometry,
            unmatched_values,
            out_of_range,
            features: layer.len(),
        }
    }

    /// Returns `true` if every batch loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.batches.iter().any(BatchOutcome::is_failure)
    }

    /// Iterates over batches that did not load.
    pub fn failed(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|b| b.is_failure())
    }

    /// Logs every diagnostic at `warn` level.
    pub fn log_diagnostics(&self) {
        for batch in self.failed() {
            match &batch.status {
                BatchStatus::Failed(e) => {
                    log::warn!("Batch {} ({} regions) failed: {e}", batch.index, batch.ids.len());
                }
                BatchStatus::Aborted(reason) => {
                    log::warn!(
                        "Batch {} ({} regions) aborted: {reason}",
                        batch.index,
                        batch.ids.len()
                    );
                }
                BatchStatus::Loaded { .. } => {}
            }
        }
        if !self.missing_geometry.is_empty() {
            log::warn!(
                "{} requested regions returned no geometry: {}",
                self.missing_geometry.len(),
                preview(&self.missing_geometry)
            );
        }
        if !self.unmatched_values.is_empty() {
            log::warn!(
                "{} regions with values were never drawn: {}",
                self.unmatched_values.len(),
                preview(&self.unmatched_values)
            );
        }
        if !self.out_of_range.is_empty() {
            log::warn!(
                "{} regions fell outside the classifier range: {}",
                self.out_of_range.len(),
                preview(&self.out_of_range)
            );
        }
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failed().count();
        write!(
            f,
            "{} features from {}/{} batches ({failed} failed); \
             {} missing geometry, {} unmatched values, {} out of range",
            self.features,
            self.batches.len() - failed,
            self.batches.len(),
            self.missing_geometry.len(),
            self.unmatched_values.len(),
            self.out_of_range.len(),
        )
    }
}

/// Joins up to ten identifiers for a log line.
fn preview(ids: &[String]) -> String {
    const MAX: usize = 10;
    if ids.len() <= MAX {
        ids.join(", ")
    } else {
        format!("{}, ... ({} more)", ids[..MAX].join(", "), ids.len() - MAX)
    }
}
