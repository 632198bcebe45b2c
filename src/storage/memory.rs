//! In-memory backend for tests. Same contract as the real ones, including
//! sniff-before-write and NotFound on unknown ids.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use super::{sniff_image, BlobStore, StorageError, StoredBlob};

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<Uuid, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.blobs.lock().unwrap().contains_key(&id)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, data: Bytes) -> Result<Uuid, StorageError> {
        let Some(mime) = sniff_image(&data) else {
            return Err(StorageError::UnsupportedMediaType);
        };
        let id = Uuid::new_v4();
        self.blobs.lock().unwrap().insert(
            id,
            StoredBlob {
                content_type: mime.to_string(),
                data,
            },
        );
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<StoredBlob, StorageError> {
        self.blobs
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        match self.blobs.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound),
        }
    }
}
