use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::{AppConfig, BlobBackend};
use crate::detect::{DetectionClient, HttpDetectionClient};
use crate::scans::service::{IngestPipeline, PgScanRecorder, ScanRecorder};
use crate::storage::{BlobStore, DbBlobStore, FsBlobStore};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub blobs: Arc<dyn BlobStore>,
    pub pipeline: Arc<IngestPipeline>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let blobs: Arc<dyn BlobStore> = match config.blob.backend {
            BlobBackend::Fs => Arc::new(
                FsBlobStore::new(config.blob.fs_root.as_str())
                    .context("create blob root directory")?,
            ),
            BlobBackend::Db => Arc::new(DbBlobStore::new(db.clone())),
        };

        let detector: Arc<dyn DetectionClient> = Arc::new(HttpDetectionClient::new(
            config.detector.url.as_str(),
            config.detector.timeout(),
        )?);
        let recorder: Arc<dyn ScanRecorder> = Arc::new(PgScanRecorder::new(db.clone()));
        let pipeline = Arc::new(IngestPipeline::new(blobs.clone(), detector, recorder));

        Ok(Self {
            db,
            config,
            blobs,
            pipeline,
        })
    }

    /// Assemble a state from already-built parts; tests use this to swap
    /// in in-memory storage or fake collaborators.
    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        blobs: Arc<dyn BlobStore>,
        pipeline: Arc<IngestPipeline>,
    ) -> Self {
        Self {
            db,
            config,
            blobs,
            pipeline,
        }
    }
}
