use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

mod db;
mod fs;
mod sniff;
#[cfg(test)]
pub mod memory;

pub use db::DbBlobStore;
pub use fs::FsBlobStore;
pub use sniff::sniff_image;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("payload is not a recognized image format")]
    UnsupportedMediaType,

    #[error("no blob stored under that id")]
    NotFound,

    #[error("blob io failed")]
    Io(#[from] std::io::Error),

    #[error("blob database access failed")]
    Database(#[from] sqlx::Error),
}

/// A stored blob as handed back to callers: the raw bytes plus the MIME
/// type that was sniffed at store time.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub content_type: String,
    pub data: Bytes,
}

/// Durable key-value storage for raw image bytes. Backends are
/// interchangeable; callers hold this trait object and never know which
/// one is behind it.
///
/// `store` must sniff the payload before writing anything and reject
/// non-images; identifiers are fresh UUID v4 per call. None of these
/// operations participate in a database transaction; they are not
/// rollback-aware, and the ingestion pipeline compensates explicitly.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, data: Bytes) -> Result<Uuid, StorageError>;
    async fn get(&self, id: Uuid) -> Result<StoredBlob, StorageError>;
    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;
}
