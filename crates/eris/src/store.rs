//! Block store interface and the in-memory implementation.
//!
//! The encoding core needs only an async map from 32-byte references to
//! ciphertext blobs. Backends (disk, object storage, network) implement
//! [`BlockStore`]; see the `eris-store` crate for the OpenDAL backend.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use crate::block::Reference;
use crate::error::{ErisError, Result};

/// Async block storage keyed by reference.
///
/// The store performs no verification or decryption; it sees only opaque
/// ciphertext of exactly one block size. References are content-derived,
/// so `put` is idempotent for a given reference and last-writer-wins is
/// safe under concurrent use.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Fetch the ciphertext stored under `reference`, or fail with
    /// [`ErisError::BlockNotFound`].
    async fn get(&self, reference: &Reference) -> Result<Bytes>;

    /// Store `block` under `reference`. Completion means the block is as
    /// durable as the backend provides.
    async fn put(&self, reference: &Reference, block: Bytes) -> Result<()>;

    /// Release backend resources.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<S: BlockStore + ?Sized> BlockStore for &S {
    async fn get(&self, reference: &Reference) -> Result<Bytes> {
        (**self).get(reference).await
    }

    async fn put(&self, reference: &Reference, block: Bytes) -> Result<()> {
        (**self).put(reference, block).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

#[async_trait]
impl<S: BlockStore + ?Sized> BlockStore for Arc<S> {
    async fn get(&self, reference: &Reference) -> Result<Bytes> {
        (**self).get(reference).await
    }

    async fn put(&self, reference: &Reference, block: Bytes) -> Result<()> {
        (**self).put(reference, block).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

/// In-memory block store. Cheap to clone (clones share the map); useful for
/// tests and small trees.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blocks: Arc<RwLock<HashMap<Reference, Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks stored.
    pub fn len(&self) -> usize {
        self.blocks.read().expect("store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn get(&self, reference: &Reference) -> Result<Bytes> {
        self.blocks
            .read()
            .expect("store lock")
            .get(reference)
            .cloned()
            .ok_or(ErisError::BlockNotFound(*reference))
    }

    async fn put(&self, reference: &Reference, block: Bytes) -> Result<()> {
        self.blocks
            .write()
            .expect("store lock")
            .insert(*reference, block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(byte: u8) -> Reference {
        Reference::from_bytes([byte; 32])
    }

    #[tokio::test]
    async fn put_and_get() {
        let store = MemoryStore::new();
        let r = reference(1);
        store.put(&r, Bytes::from_static(b"ciphertext")).await.unwrap();
        assert_eq!(store.get(&r).await.unwrap().as_ref(), b"ciphertext");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get(&reference(9)).await.unwrap_err();
        assert!(matches!(err, ErisError::BlockNotFound(_)));
    }

    #[tokio::test]
    async fn put_is_idempotent_per_reference() {
        let store = MemoryStore::new();
        let r = reference(2);
        store.put(&r, Bytes::from_static(b"same")).await.unwrap();
        store.put(&r, Bytes::from_static(b"same")).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let a = MemoryStore::new();
        let b = a.clone();
        let r = reference(3);
        a.put(&r, Bytes::from_static(b"shared")).await.unwrap();
        assert_eq!(b.get(&r).await.unwrap().as_ref(), b"shared");
    }
}
