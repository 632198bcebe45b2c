use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::dto::ScanWithItems;
use super::repo;
use crate::detect::{DetectionClient, Prediction};
use crate::error::AppError;
use crate::storage::BlobStore;

/// Server-side date at day granularity; the client never supplies it.
/// Falls back to UTC when the local offset cannot be determined.
pub fn local_date_now() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Transactional writer for one ingestion: day-log find-or-create, the
/// scan row and all its item rows commit together or not at all.
#[async_trait]
pub trait ScanRecorder: Send + Sync {
    async fn record(
        &self,
        user_id: Uuid,
        image_id: Uuid,
        prediction: &Prediction,
    ) -> Result<ScanWithItems, AppError>;
}

pub struct PgScanRecorder {
    pool: PgPool,
}

impl PgScanRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScanRecorder for PgScanRecorder {
    async fn record(
        &self,
        user_id: Uuid,
        image_id: Uuid,
        prediction: &Prediction,
    ) -> Result<ScanWithItems, AppError> {
        let today = local_date_now();

        let mut tx = self.pool.begin().await?;
        let day_log = repo::find_or_create_day_log(&mut tx, user_id, today).await?;
        let scan =
            repo::insert_scan_tx(&mut tx, day_log.id, prediction.total_calories, image_id).await?;

        let mut items = Vec::with_capacity(prediction.items.len());
        for item in &prediction.items {
            items.push(repo::insert_scan_item_tx(&mut tx, scan.id, item).await?);
        }
        tx.commit().await?;

        debug!(scan_id = %scan.id, day_log_id = %day_log.id, items = items.len(), "scan recorded");
        Ok(ScanWithItems { scan, items })
    }
}

/// Pipeline controller for one ingestion request:
/// store blob, call detection, record the result.
///
/// The blob write is the only non-transactional side effect that can leak;
/// if detection or recording fails afterwards we issue a best-effort
/// compensating delete. A failed compensation is logged and swallowed so
/// the original stage error is always the one the caller sees.
pub struct IngestPipeline {
    blobs: Arc<dyn BlobStore>,
    detector: Arc<dyn DetectionClient>,
    recorder: Arc<dyn ScanRecorder>,
}

impl IngestPipeline {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        detector: Arc<dyn DetectionClient>,
        recorder: Arc<dyn ScanRecorder>,
    ) -> Self {
        Self {
            blobs,
            detector,
            recorder,
        }
    }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn ingest(
        &self,
        user_id: Uuid,
        image: Bytes,
        filename: &str,
    ) -> Result<ScanWithItems, AppError> {
        // Stage 1: durable blob write. A rejection here leaves nothing behind.
        let image_id = self.blobs.store(image.clone()).await?;
        debug!(%image_id, "blob stored");

        // Stage 2: external inference.
        let prediction = match self.detector.detect(image, filename).await {
            Ok(p) => p,
            Err(cause) => {
                self.compensate(image_id).await;
                return Err(AppError::DetectionUnavailable(cause));
            }
        };

        // Stage 3: atomic relational write.
        match self.recorder.record(user_id, image_id, &prediction).await {
            Ok(recorded) => Ok(recorded),
            Err(err) => {
                self.compensate(image_id).await;
                Err(err)
            }
        }
    }

    async fn compensate(&self, image_id: Uuid) {
        if let Err(e) = self.blobs.delete(image_id).await {
            warn!(%image_id, error = %e, "compensating blob delete failed, original error stands");
        }
    }
}
