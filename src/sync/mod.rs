//! Mirror a source catalog into the database.
//!
//! A pass walks the source in fixed-size batches. Each batch is one SQLite
//! transaction and each item inside it runs under its own savepoint, so a
//! failing item is rolled back and counted while the rest of the batch still
//! commits. Failures outside any single item (opening or committing a batch,
//! fetching from the source) abort the pass.

pub mod reconcile;
pub mod relations;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::SyncConfig;
use crate::db::{Database, PhotoFields, Store};
use crate::source::{CatalogEntry, CatalogSource, SourceItem};

pub use reconcile::{decide, Decision};
pub use relations::sync_relationships;

/// Settings for one sync pass.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Update every existing photo regardless of modification dates.
    pub force_update: bool,
    /// Items per transaction. Must be at least 1.
    pub batch_size: usize,
    /// Only look at the first `limit` source items.
    pub limit: Option<usize>,
    /// Replace shared album memberships instead of only adding to them.
    pub prune_shared_albums: bool,
    /// Emit a progress event every this many items. Zero disables them.
    pub progress_interval: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            force_update: false,
            batch_size: 100,
            limit: None,
            prune_shared_albums: false,
            progress_interval: 10,
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            prune_shared_albums: config.prune_shared_albums,
            progress_interval: config.progress_interval,
            ..Self::default()
        }
    }
}

/// Counters for a pass. `created + updated + skipped + errors == processed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SyncStats {
    fn record(&mut self, outcome: ItemOutcome) {
        self.processed += 1;
        match outcome {
            ItemOutcome::Created => self.created += 1,
            ItemOutcome::Updated => self.updated += 1,
            ItemOutcome::Skipped => self.skipped += 1,
        }
    }

    fn record_error(&mut self) {
        self.processed += 1;
        self.errors += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Created,
    Updated,
    Skipped,
}

/// Progress events reported while a pass runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncProgress {
    Started { total: usize },
    Progress { stats: SyncStats, total: usize },
    ItemFailed { uuid: String, message: String },
    BatchCommitted { batch: usize, items: usize },
    Completed(SyncStats),
}

fn emit(progress: &mut Option<&mut dyn FnMut(SyncProgress)>, event: SyncProgress) {
    if let Some(cb) = progress {
        cb(event);
    }
}

fn record_failure(
    stats: &mut SyncStats,
    progress: &mut Option<&mut dyn FnMut(SyncProgress)>,
    uuid: &str,
    message: String,
) {
    stats.record_error();
    tracing::warn!(uuid, error = %message, "Failed to sync photo");
    emit(
        progress,
        SyncProgress::ItemFailed {
            uuid: uuid.to_string(),
            message,
        },
    );
}

/// Runs sync passes.
///
/// All writes of a batch go through the one connection owned by the
/// [`Database`], which is what makes get-or-create on album, tag and person
/// names safe. Running two passes against the same database file from
/// separate processes at the same time is not supported.
pub struct Syncer {
    options: SyncOptions,
}

impl Syncer {
    pub fn new(options: SyncOptions) -> Result<Self> {
        if options.batch_size == 0 {
            anyhow::bail!("batch size must be at least 1");
        }
        Ok(Self { options })
    }

    pub fn run(
        &self,
        db: &mut Database,
        source: &mut dyn CatalogSource,
        mut progress: Option<&mut dyn FnMut(SyncProgress)>,
    ) -> Result<SyncStats> {
        let total = match self.options.limit {
            Some(limit) => limit.min(source.len()),
            None => source.len(),
        };

        tracing::info!(
            total,
            batch_size = self.options.batch_size,
            force_update = self.options.force_update,
            "Starting sync"
        );
        emit(&mut progress, SyncProgress::Started { total });

        let mut stats = SyncStats::default();
        let mut offset = 0;
        let mut batch = 0;

        while offset < total {
            let count = self.options.batch_size.min(total - offset);
            let items = source
                .fetch(offset, count)
                .with_context(|| format!("Failed to fetch catalog items {offset}..{}", offset + count))?;
            if items.is_empty() {
                tracing::warn!(offset, total, "Catalog returned fewer items than reported");
                break;
            }

            batch += 1;
            let fetched = items.len();
            self.run_batch(db, &items, total, &mut stats, &mut progress)
                .with_context(|| format!("Batch {batch} failed"))?;

            tracing::debug!(batch, items = fetched, "Committed batch");
            emit(&mut progress, SyncProgress::BatchCommitted { batch, items: fetched });
            offset += fetched;
        }

        tracing::info!(
            processed = stats.processed,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            errors = stats.errors,
            "Sync complete"
        );
        emit(&mut progress, SyncProgress::Completed(stats));

        Ok(stats)
    }

    fn run_batch(
        &self,
        db: &mut Database,
        entries: &[CatalogEntry],
        total: usize,
        stats: &mut SyncStats,
        progress: &mut Option<&mut dyn FnMut(SyncProgress)>,
    ) -> Result<()> {
        let mut tx = db.transaction()?;

        for entry in entries {
            match entry {
                Ok(item) => {
                    let sp = tx.savepoint()?;
                    let result = self.sync_item(&Store::new(&sp), item);
                    match result {
                        Ok(outcome) => {
                            sp.commit()?;
                            stats.record(outcome);
                        }
                        Err(e) => {
                            // Savepoints roll back on finish unless committed
                            sp.finish()?;
                            record_failure(stats, progress, &item.uuid, format!("{e:#}"));
                        }
                    }
                }
                Err(invalid) => record_failure(stats, progress, &invalid.uuid, invalid.to_string()),
            }

            let interval = self.options.progress_interval;
            if interval > 0 && stats.processed % interval == 0 {
                emit(progress, SyncProgress::Progress { stats: *stats, total });
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn sync_item(&self, store: &Store<'_>, item: &SourceItem) -> Result<ItemOutcome> {
        if item.uuid.trim().is_empty() {
            anyhow::bail!("catalog item has no uuid");
        }

        let existing = store.find_photo_state(&item.uuid)?;
        let source_modified = item.date_modified.map(|d| d.to_utc());

        let (photo_id, outcome) = match decide(existing, source_modified, self.options.force_update) {
            Decision::Skip(_) => return Ok(ItemOutcome::Skipped),
            Decision::Create => (store.insert_photo(&PhotoFields::from(item))?, ItemOutcome::Created),
            Decision::Update(id) => {
                store.update_photo(id, &PhotoFields::from(item))?;
                (id, ItemOutcome::Updated)
            }
        };

        sync_relationships(store, photo_id, item, self.options.prune_shared_albums)?;
        Ok(outcome)
    }
}
