//! Layer assembly.
//!
//! [`LayerAssembler::load`] creates an empty styled layer, attaches it to
//! the map, and dispatches one task per batch before returning. Batches
//! merge into the layer in whatever order their fetches resolve; a failed
//! fetch leaves the other batches unaffected. [`LoadCompletion::wait`]
//! resolves once every batch has settled.

use std::sync::Arc;

use choropleth_map_fetch::{GeometrySource, build_query, partition};
use choropleth_map_models::ChoroplethConfig;
use tokio::task::JoinHandle;

use crate::{
    BatchOutcome, BatchStatus, FeatureStyler, LayerError, LayerHandle, LoadReport, MapContext,
    MapLayer, ValueTable,
};

/// Drives one choropleth rendering pass.
pub struct LayerAssembler {
    config: ChoroplethConfig,
    source: Arc<dyn GeometrySource>,
}

impl LayerAssembler {
    /// Creates an assembler for `config` fetching from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Config`] if the configuration is invalid.
    pub fn new(
        config: ChoroplethConfig,
        source: Arc<dyn GeometrySource>,
    ) -> Result<Self, LayerError> {
        config.validate()?;
        Ok(Self { config, source })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ChoroplethConfig {
        &self.config
    }

    /// Starts loading every region of `table` into a new layer.
    ///
    /// Returns as soon as all batches are dispatched. The layer is already
    /// attached to `map` and keeps growing as fetches resolve.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the styler cannot be built or no tokio
    /// runtime is running.
    pub fn load(
        &self,
        map: &mut dyn MapContext,
        table: Arc<ValueTable>,
    ) -> Result<LayerLoad, LayerError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| LayerError::NoRuntime)?;

        let styler = Arc::new(FeatureStyler::from_config(Arc::clone(&table), &self.config)?);
        let layer = LayerHandle::new(MapLayer::new(
            self.config.id.clone(),
            self.config.join_column.clone(),
            styler,
        ));
        map.attach(layer.clone());

        let batches = partition(&table.ids(), self.config.batch_size);
        log::info!(
            "{}: dispatching {} batches for {} regions",
            self.config.id,
            batches.len(),
            table.len()
        );

        let tasks = batches
            .into_iter()
            .enumerate()
            .map(|(index, ids)| {
                let params =
                    build_query(&self.config.query, &self.config.join_column, ids.as_slice());
                let source = Arc::clone(&self.source);
                let layer = layer.clone();
                let task_ids = ids.clone();

                let handle = runtime.spawn(async move {
                    match source.fetch(&params).await {
                        Ok(collection) => {
                            let arrived = layer.merge(collection);
                            log::info!("Batch {index}: merged {} features", arrived.len());
                            BatchOutcome::loaded(index, task_ids, &arrived)
                        }
                        Err(e) => {
                            log::warn!("Batch {index}: fetch failed: {e}");
                            BatchOutcome {
                                index,
                                ids: task_ids,
                                status: BatchStatus::Failed(e),
                            }
                        }
                    }
                });

                PendingBatch { index, ids, handle }
            })
            .collect();

        Ok(LayerLoad {
            layer: layer.clone(),
            completion: LoadCompletion {
                tasks,
                layer,
                table,
            },
        })
    }
}

/// The live layer plus the means to await its completion.
pub struct LayerLoad {
    /// The layer, already attached and populating.
    pub layer: LayerHandle,
    /// Resolves when every batch has settled.
    pub completion: LoadCompletion,
}

struct PendingBatch {
    index: usize,
    ids: Vec<String>,
    handle: JoinHandle<BatchOutcome>,
}

/// Aggregate completion of all batches of one load.
pub struct LoadCompletion {
    tasks: Vec<PendingBatch>,
    layer: LayerHandle,
    table: Arc<ValueTable>,
}

impl LoadCompletion {
    /// Returns the number of dispatched batches.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every batch to settle and reports each outcome.
    ///
    /// Never fails: fetch errors and aborted tasks are recorded per batch.
    pub async fn wait(self) -> LoadReport {
        let (meta, handles): (Vec<_>, Vec<_>) = self
            .tasks
            .into_iter()
            .map(|t| ((t.index, t.ids), t.handle))
            .unzip();

        let results = futures::future::join_all(handles).await;

        let outcomes = meta
            .into_iter()
            .zip(results)
            .map(|((index, ids), result)| {
                result.unwrap_or_else(|e| BatchOutcome {
                    index,
                    ids,
                    status: BatchStatus::Aborted(e.to_string()),
                })
            })
            .collect();

        let report = self
            .layer
            .read(|layer| LoadReport::new(outcomes, layer, &self.table));
        log::info!("Load finished: {report}");
        report.log_diagnostics();
        report
    }
}
