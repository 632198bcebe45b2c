use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use super::{sniff_image, BlobStore, StorageError, StoredBlob};

/// Filesystem backend: one file per blob id inside a flat root directory.
/// The file name is the id itself, no extension, so `get` re-sniffs the
/// bytes to recover the content type.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.root.join(id.to_string())
    }
}

fn not_found_as(err: std::io::Error) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound
    } else {
        StorageError::Io(err)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, data: Bytes) -> Result<Uuid, StorageError> {
        if sniff_image(&data).is_none() {
            return Err(StorageError::UnsupportedMediaType);
        }
        let id = Uuid::new_v4();
        tokio::fs::write(self.path_for(id), &data).await?;
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<StoredBlob, StorageError> {
        let data = match tokio::fs::read(self.path_for(id)).await {
            Ok(v) => v,
            Err(e) => return Err(not_found_as(e)),
        };
        let content_type = sniff_image(&data)
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(StoredBlob {
            content_type,
            data: Bytes::from(data),
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) => Err(not_found_as(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

    fn store_in_tempdir() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn store_then_get_then_delete() {
        let (_dir, store) = store_in_tempdir();

        let id = store.store(Bytes::from_static(PNG)).await.unwrap();
        let blob = store.get(id).await.unwrap();
        assert_eq!(blob.content_type, "image/png");
        assert_eq!(&blob.data[..], PNG);

        store.delete(id).await.unwrap();
        assert!(matches!(store.get(id).await, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn rejects_non_image_before_writing() {
        let (dir, store) = store_in_tempdir();

        let err = store
            .store(Bytes::from_static(b"plain text pretending to be food.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedMediaType));

        // Nothing may be written on rejection.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_not_found() {
        let (_dir, store) = store_in_tempdir();
        assert!(matches!(
            store.delete(Uuid::new_v4()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn creates_root_directory_if_absent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let store = FsBlobStore::new(&nested).unwrap();
        assert!(nested.is_dir());
        store.store(Bytes::from_static(PNG)).await.unwrap();
    }
}
