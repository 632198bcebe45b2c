use async_trait::async_trait;
use bytes::Bytes;
use sqlx::PgPool;
use uuid::Uuid;

use super::{sniff_image, BlobStore, StorageError, StoredBlob};

/// Relational backend: bytes live in the `images` table as a BYTEA column,
/// keyed by the blob id, with the sniffed MIME type stored alongside.
///
/// Shares the application pool but every call is a standalone statement;
/// the store is never enlisted in the ingestion transaction.
#[derive(Clone)]
pub struct DbBlobStore {
    pool: PgPool,
}

impl DbBlobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlobStore for DbBlobStore {
    async fn store(&self, data: Bytes) -> Result<Uuid, StorageError> {
        let Some(mime) = sniff_image(&data) else {
            return Err(StorageError::UnsupportedMediaType);
        };
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO images (id, mime_type, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(mime)
        .bind(&data[..])
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<StoredBlob, StorageError> {
        let row = sqlx::query_as::<_, (String, Vec<u8>)>(
            r#"
            SELECT mime_type, data
            FROM images
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((content_type, data)) => Ok(StoredBlob {
                content_type,
                data: Bytes::from(data),
            }),
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        let done = sqlx::query(
            r#"
            DELETE FROM images
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
