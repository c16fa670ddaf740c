//! OpenDAL-backed block stores for the eris encoding.
//!
//! Blocks are written under `blocks/<base32 reference>`. Because references
//! are content-derived, concurrent writers racing on the same reference
//! write identical bytes and last-writer-wins is safe.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use opendal::Operator;

use eris::{BlockStore, ErisError, Reference};

/// Minimal configuration for an S3-compatible backend.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// A block store over any OpenDAL service.
#[derive(Debug, Clone)]
pub struct OpendalStore {
    op: Operator,
}

impl OpendalStore {
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    /// Local filesystem backend rooted at `root`.
    pub fn open_fs(root: &str) -> Result<Self> {
        let builder = opendal::services::Fs::default().root(root);
        Ok(Self::new(build(builder).context("creating OpenDAL fs operator")?))
    }

    /// In-memory backend, for tests and scratch use.
    pub fn open_memory() -> Result<Self> {
        let builder = opendal::services::Memory::default();
        Ok(Self::new(build(builder).context("creating OpenDAL memory operator")?))
    }

    /// S3-compatible backend. Uses path-style addressing, as required by
    /// MinIO and SeaweedFS.
    pub fn open_s3(cfg: &StoreConfig) -> Result<Self> {
        if cfg.endpoint.starts_with("http://") {
            tracing::warn!(
                endpoint = %cfg.endpoint,
                "S3 endpoint uses plaintext HTTP; credentials are transmitted unencrypted"
            );
        }
        let builder = opendal::services::S3::default()
            .endpoint(&cfg.endpoint)
            .region(&cfg.region)
            .bucket(&cfg.bucket)
            .access_key_id(&cfg.access_key_id)
            .secret_access_key(&cfg.secret_access_key);
        Ok(Self::new(build(builder).context("creating OpenDAL S3 operator")?))
    }

    fn path(reference: &Reference) -> String {
        format!("blocks/{reference}")
    }
}

fn build<B: opendal::Builder>(builder: B) -> Result<Operator> {
    let op = Operator::new(builder)?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
        .finish();
    Ok(op)
}

fn map_err(reference: &Reference, err: opendal::Error) -> ErisError {
    if err.kind() == opendal::ErrorKind::NotFound {
        ErisError::BlockNotFound(*reference)
    } else {
        ErisError::Io(err.into())
    }
}

#[async_trait]
impl BlockStore for OpendalStore {
    async fn get(&self, reference: &Reference) -> eris::Result<Bytes> {
        let buffer = self
            .op
            .read(&Self::path(reference))
            .await
            .map_err(|e| map_err(reference, e))?;
        Ok(buffer.to_bytes())
    }

    async fn put(&self, reference: &Reference, block: Bytes) -> eris::Result<()> {
        self.op
            .write(&Self::path(reference), block)
            .await
            .map_err(|e| map_err(reference, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eris::{decode, encode, BlockSize, Secret};

    #[tokio::test]
    async fn memory_backend_round_trips_blocks() {
        let store = OpendalStore::open_memory().unwrap();
        let reference = Reference::from_bytes([0xAB; 32]);
        store
            .put(&reference, Bytes::from_static(b"ciphertext"))
            .await
            .unwrap();
        assert_eq!(store.get(&reference).await.unwrap().as_ref(), b"ciphertext");
    }

    #[tokio::test]
    async fn missing_block_maps_to_not_found() {
        let store = OpendalStore::open_memory().unwrap();
        let reference = Reference::from_bytes([1; 32]);
        let err = store.get(&reference).await.unwrap_err();
        assert!(matches!(err, ErisError::BlockNotFound(_)));
    }

    #[tokio::test]
    async fn encode_decode_through_memory_backend() {
        let store = OpendalStore::open_memory().unwrap();
        let content: Vec<u8> = (0u8..=255).cycle().take(5000).collect();
        let cap = encode(&store, &content, BlockSize::Kib1, Secret::zero())
            .await
            .unwrap();
        assert_eq!(decode(&store, &cap).await.unwrap(), content);
    }

    #[tokio::test]
    async fn encode_decode_through_fs_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = OpendalStore::open_fs(dir.path().to_str().unwrap()).unwrap();
        let content = b"persisted to disk";
        let cap = encode(&store, content, BlockSize::Kib1, Secret::zero())
            .await
            .unwrap();

        // A second operator over the same root sees the blocks.
        let reopened = OpendalStore::open_fs(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(decode(&reopened, &cap).await.unwrap(), content);
    }
}
