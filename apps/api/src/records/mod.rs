//! Read path for persisted analysis records.

pub mod handles;

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{storage_key, AnalysisRecord};
use crate::records::handles::{HandleTable, ImageHandle};
use crate::services::blob::BlobStore;
use crate::services::kv::KvStore;

/// Outcome of a record lookup. Absence and corruption are ordinary results,
/// not errors: callers render them, they don't catch them.
pub enum LoadOutcome {
    Found(ResumeView),
    NotFound,
    Corrupt { reason: String },
}

/// A display-ready record: the persisted data plus a scoped handle to the
/// rendered first-page image.
pub struct ResumeView {
    pub record: AnalysisRecord,
    pub image: ImageHandle,
}

pub struct RecordStore {
    kv: Arc<dyn KvStore>,
    blobs: Arc<dyn BlobStore>,
    handles: HandleTable,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KvStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            kv,
            blobs,
            handles: HandleTable::new(),
        }
    }

    /// Reads the record stored under `resume:{id}` and its rendered image.
    pub async fn load(&self, id: Uuid) -> Result<LoadOutcome, AppError> {
        let Some(raw) = self.kv.get(&storage_key(id)).await? else {
            return Ok(LoadOutcome::NotFound);
        };

        let record: AnalysisRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                return Ok(LoadOutcome::Corrupt {
                    reason: format!("stored value does not match the record schema: {e}"),
                })
            }
        };

        let image_bytes = self.blobs.read(&record.image_path).await?;
        let image = self.handles.insert(image_bytes);

        Ok(LoadOutcome::Found(ResumeView { record, image }))
    }

    /// All stored records, newest first. Unreadable values are skipped with
    /// a warning rather than failing the whole listing.
    pub async fn list(&self) -> Result<Vec<AnalysisRecord>, AppError> {
        let keys = self.kv.list("resume:*").await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(raw) = self.kv.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<AnalysisRecord>(&raw) {
                Ok(record) => records.push(record),
                Err(e) => warn!(%key, "skipping unreadable analysis record: {e}"),
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
