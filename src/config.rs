use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    /// One file per blob id under `fs_root`.
    Fs,
    /// Bytes in the `images` table.
    Db,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    pub backend: BlobBackend,
    pub fs_root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl DetectorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub blob: BlobConfig,
    pub detector: DetectorConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let blob = BlobConfig {
            backend: match std::env::var("BLOB_BACKEND").as_deref() {
                Ok("fs") => BlobBackend::Fs,
                Ok("db") | Err(_) => BlobBackend::Db,
                Ok(other) => anyhow::bail!("unknown BLOB_BACKEND {other:?}, expected fs or db"),
            },
            fs_root: std::env::var("BLOB_FS_ROOT").unwrap_or_else(|_| "./storage".into()),
        };
        let detector = DetectorConfig {
            url: std::env::var("DETECTOR_URL")
                .unwrap_or_else(|_| "http://localhost:5000/detect".into()),
            timeout_secs: std::env::var("DETECTOR_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(15),
        };
        Ok(Self {
            database_url,
            blob,
            detector,
        })
    }
}
