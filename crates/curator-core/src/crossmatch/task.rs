//! Resumable batch loop: homogenize a raw table and crossmatch it batch by
//! batch.
//!
//! Each batch is fetched after the last committed record id, so a crashed
//! or stopped run restarts from the last fully written batch. Partitions of
//! the id space ([`CursorRange`]) can run in parallel on separate tasks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{CrossmatchEngine, OutcomeCounts};
use crate::catalog::{CatalogObject, RawCatalog, Record};
use crate::config::{CurationConfig, DEFAULT_BATCH_SIZE};
use crate::errgroup::ErrorGroup;
use crate::error::{ConfigurationError, Result};
use crate::homogenization::get_homogenization;
use crate::plugin::{MatcherSpec, PluginRegistry, SolverSpec};
use crate::repository::{Layer0Repository, Layer2Repository};
use crate::table::RECORD_ID_COLUMN;

/// Slice of the record id space owned by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorRange {
    /// Exclusive lower bound. `None` starts at the beginning.
    pub start_after: Option<String>,
    /// Inclusive upper bound. `None` runs to the end.
    pub end_at: Option<String>,
}

impl CursorRange {
    /// The whole table.
    pub fn full() -> Self {
        Self::default()
    }

    /// Resume after a previously committed cursor.
    pub fn resume_after(cursor: impl Into<String>) -> Self {
        Self {
            start_after: Some(cursor.into()),
            end_at: None,
        }
    }

    pub fn with_end(mut self, end_at: impl Into<String>) -> Self {
        self.end_at = Some(end_at.into());
        self
    }

    pub fn is_full(&self) -> bool {
        self.start_after.is_none() && self.end_at.is_none()
    }

    fn admits(&self, record_id: &str) -> bool {
        self.end_at.as_deref().map_or(true, |end| record_id <= end)
    }
}

/// External stop request, honoured between batches.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Report emitted after each committed batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    /// One-based batch number within this run.
    pub batch: usize,
    pub new: usize,
    pub existing: usize,
    pub collision: usize,
    /// Last record id of the batch.
    pub cursor: String,
    /// Approximate position of `cursor` in the id space, in `[0, 1]`.
    pub fraction: Option<f64>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Every row in range was processed.
    Completed {
        batches: usize,
        counts: OutcomeCounts,
        cursor: Option<String>,
    },
    /// The table was already processed and unchanged.
    Skipped,
    /// A stop was requested; `cursor` is the last committed batch boundary.
    Stopped {
        batches: usize,
        counts: OutcomeCounts,
        cursor: Option<String>,
    },
}

/// Approximate position of a record id in the id space.
///
/// The first 16 hex digits (dashes ignored, shorter ids padded with zeros)
/// are read as a `u64` and divided by `u64::MAX`. Non-hex ids give `None`.
pub fn cursor_fraction(record_id: &str) -> Option<f64> {
    let digits: String = record_id.chars().filter(|c| *c != '-').take(16).collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let padded = format!("{:0<16}", digits);
    let position = u64::from_str_radix(&padded, 16).ok()?;
    Some(position as f64 / u64::MAX as f64)
}

/// Homogenizes and crossmatches one raw table in batches.
pub struct CrossmatchTask {
    layer0: Arc<dyn Layer0Repository>,
    engine: CrossmatchEngine,
    batch_size: usize,
    ignore_errors: bool,
}

impl CrossmatchTask {
    pub fn new(layer0: Arc<dyn Layer0Repository>, engine: CrossmatchEngine) -> Self {
        Self {
            layer0,
            engine,
            batch_size: DEFAULT_BATCH_SIZE,
            ignore_errors: true,
        }
    }

    /// Build the engine and task from configuration with explicit registries.
    pub fn from_config(
        layer0: Arc<dyn Layer0Repository>,
        layer2: Arc<dyn Layer2Repository>,
        config: &CurationConfig,
        matchers: &PluginRegistry<MatcherSpec>,
        solvers: &PluginRegistry<SolverSpec>,
    ) -> std::result::Result<Self, ConfigurationError> {
        let engine = CrossmatchEngine::from_config(layer2, &config.crossmatch, matchers, solvers)?;
        Ok(Self::new(layer0, engine)
            .with_batch_size(config.crossmatch.batch_size)
            .with_ignore_errors(config.homogenization.ignore_errors))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }

    pub fn engine(&self) -> &CrossmatchEngine {
        &self.engine
    }

    /// Run over `range` until the rows run out or `stop` is raised.
    ///
    /// The homogenization is built before the first row is fetched, so
    /// configuration problems fail the run without side effects. A full-range
    /// run that completes records the processing time on the table.
    pub fn run<F>(
        &self,
        table_id: i64,
        range: &CursorRange,
        stop: &StopSignal,
        mut on_progress: F,
    ) -> Result<TaskOutcome>
    where
        F: FnMut(&BatchProgress),
    {
        let statistics = self.layer0.get_table_statistics(table_id)?;
        if statistics.is_up_to_date() {
            info!(table_id, "table unchanged since last crossmatch, skipping");
            return Ok(TaskOutcome::Skipped);
        }

        let meta = self.layer0.fetch_metadata(table_id)?;
        let rules = self.layer0.get_homogenization_rules()?;
        let params = self.layer0.get_homogenization_params()?;
        let homogenization =
            get_homogenization(&rules, &params, &meta)?.with_ignore_errors(self.ignore_errors);

        info!(
            table_id,
            table = %meta.table_name,
            batch_size = self.batch_size,
            start_after = range.start_after.as_deref().unwrap_or(""),
            end_at = range.end_at.as_deref().unwrap_or(""),
            "starting crossmatch"
        );

        let mut cursor = range.start_after.clone();
        let mut counts = OutcomeCounts::default();
        let mut batches = 0;

        loop {
            if stop.is_stopped() {
                info!(table_id, batches, cursor = cursor.as_deref().unwrap_or(""), "crossmatch stopped");
                return Ok(TaskOutcome::Stopped {
                    batches,
                    counts,
                    cursor,
                });
            }

            let mut rows = self.layer0.fetch_raw_data(
                table_id,
                self.batch_size,
                cursor.as_deref(),
                RECORD_ID_COLUMN,
            )?;
            let fetched = rows.len();
            rows.retain(|row| range.admits(&row.record_id));
            let Some(last_id) = rows.last().map(|row| row.record_id.clone()) else {
                break;
            };
            let reached_end = rows.len() < fetched || fetched < self.batch_size;

            let records = homogenization.apply(&rows)?;
            self.write_objects(table_id, &records)?;

            let results = self.engine.crossmatch(&records)?;
            self.layer0.add_crossmatch_result(&results)?;

            batches += 1;
            let batch_counts: OutcomeCounts = results.values().collect();
            counts.merge(batch_counts);
            let progress = BatchProgress {
                batch: batches,
                new: batch_counts.new,
                existing: batch_counts.existing,
                collision: batch_counts.collision,
                fraction: cursor_fraction(&last_id),
                cursor: last_id,
            };
            info!(
                table_id,
                batch = progress.batch,
                rows = rows.len(),
                new = progress.new,
                existing = progress.existing,
                collision = progress.collision,
                cursor = %progress.cursor,
                fraction = progress.fraction.unwrap_or(f64::NAN),
                "crossmatch batch committed"
            );
            on_progress(&progress);
            cursor = Some(progress.cursor);

            if reached_end {
                break;
            }
        }

        if range.is_full() {
            self.layer0.set_last_processed(table_id, Utc::now())?;
        }
        info!(
            table_id,
            batches,
            new = counts.new,
            existing = counts.existing,
            collision = counts.collision,
            "crossmatch finished"
        );
        Ok(TaskOutcome::Completed {
            batches,
            counts,
            cursor,
        })
    }

    /// Write each catalog family of the batch concurrently.
    fn write_objects(&self, table_id: i64, records: &[Record]) -> Result<()> {
        let mut families: BTreeMap<RawCatalog, Vec<(String, CatalogObject)>> = BTreeMap::new();
        for record in records {
            for object in &record.data {
                families
                    .entry(object.catalog())
                    .or_default()
                    .push((record.id.clone(), object.clone()));
            }
        }
        debug!(table_id, families = families.len(), "writing catalog objects");

        let mut group = ErrorGroup::new();
        for (catalog, objects) in families {
            let layer0 = Arc::clone(&self.layer0);
            group.spawn(move || layer0.upsert_objects(table_id, catalog, objects));
        }
        group.wait()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_fraction() {
        assert_eq!(cursor_fraction("00000000-0000-0000-0000-000000000000"), Some(0.0));
        assert_eq!(cursor_fraction("ffffffff-ffff-ffff-0000-000000000000"), Some(1.0));
        let half = cursor_fraction("80000000-0000-0000-0000-000000000000").unwrap();
        assert!((half - 0.5).abs() < 1e-9);
        assert_eq!(cursor_fraction("8"), cursor_fraction("8000000000000000"));
        assert_eq!(cursor_fraction("row-17"), None);
        assert_eq!(cursor_fraction(""), None);
    }

    #[test]
    fn test_cursor_range() {
        let range = CursorRange::resume_after("b").with_end("d");
        assert!(!range.is_full());
        assert!(range.admits("c"));
        assert!(range.admits("d"));
        assert!(!range.admits("e"));
        assert!(CursorRange::full().is_full());
    }

    #[test]
    fn test_stop_signal_shared() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        clone.stop();
        assert!(signal.is_stopped());
    }
}
