//! Streaming ingest: append bytes, observe the capability mid-stream.
//!
//! Appended bytes fill a single working buffer; each time it fills, the
//! buffer is encrypted as a leaf and put to the store. `cap()` pads and
//! flushes the partial buffer, builds the interior levels bottom-up, and
//! then XORs the working buffer back to plaintext so later appends continue
//! where they left off. The padding leaf produced by `cap()` is never added
//! to the permanent leaf list, which is what makes
//! `append(a); cap(); append(b); cap()` converge with `append(a ++ b); cap()`.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::block::{BlockSize, Pair, Secret};
use crate::cap::ErisCap;
use crate::codec;
use crate::crypto;
use crate::error::Result;
use crate::store::BlockStore;
use crate::PAIR_SIZE;

/// Streaming encoder. Operations on one ingest must be serialised by the
/// caller; the store may be shared freely.
pub struct Ingest<S> {
    store: S,
    block_size: BlockSize,
    secret: Secret,
    buffer: Vec<u8>,
    pos: u64,
    leaves: Vec<Pair>,
}

impl<S: BlockStore> Ingest<S> {
    pub fn new(store: S, block_size: BlockSize, secret: Secret) -> Self {
        Self {
            store,
            block_size,
            secret,
            buffer: vec![0u8; block_size.bytes()],
            pos: 0,
            leaves: Vec::new(),
        }
    }

    /// Bytes appended since construction.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    /// Append content. Suspends on each store put triggered by a filled
    /// block, so the caller sees backpressure from the backend.
    pub async fn append(&mut self, mut data: &[u8]) -> Result<()> {
        let bs = self.block_size.bytes();
        while !data.is_empty() {
            let offset = (self.pos % bs as u64) as usize;
            let n = (bs - offset).min(data.len());
            self.buffer[offset..offset + n].copy_from_slice(&data[..n]);
            self.pos += n as u64;
            data = &data[n..];
            if offset + n == bs {
                self.flush_leaf().await?;
            }
        }
        Ok(())
    }

    async fn flush_leaf(&mut self) -> Result<()> {
        let pair = codec::encrypt_leaf(&mut self.buffer, &self.secret)?;
        trace!(reference = %pair.reference(), index = self.leaves.len(), "leaf block");
        self.store
            .put(pair.reference(), Bytes::copy_from_slice(&self.buffer))
            .await?;
        self.leaves.push(pair);
        Ok(())
    }

    /// Produce the root capability for everything appended so far, without
    /// disturbing subsequent appends.
    ///
    /// The partial buffer is padded, encrypted, and stored as a final
    /// "padding leaf", then the interior levels are built over the leaf
    /// list plus that padding leaf. Afterwards the buffer is XORed back to
    /// plaintext with the padding leaf's own key (stream ciphers are
    /// involutive), and the padding pair is discarded rather than retained.
    pub async fn cap(&mut self) -> Result<ErisCap> {
        let offset = (self.pos % self.block_size.bytes() as u64) as usize;
        codec::pad_in_place(&mut self.buffer, offset);
        let padding = codec::encrypt_leaf(&mut self.buffer, &self.secret)?;
        self.store
            .put(padding.reference(), Bytes::copy_from_slice(&self.buffer))
            .await?;
        crypto::chacha20_xor(
            padding.key().as_bytes(),
            &codec::level_nonce(0),
            &mut self.buffer,
        );

        if self.leaves.is_empty() {
            debug!(reference = %padding.reference(), "single-leaf capability");
            return Ok(ErisCap {
                block_size: self.block_size,
                level: 0,
                root: padding,
            });
        }

        let mut pairs = self.leaves.clone();
        pairs.push(padding);
        let mut level = 0u8;
        while pairs.len() > 1 {
            level += 1;
            pairs = collect_level(&self.store, self.block_size, level, &pairs).await?;
        }
        let root = pairs.swap_remove(0);
        debug!(level, leaves = self.leaves.len() + 1, reference = %root.reference(), "capability");
        Ok(ErisCap {
            block_size: self.block_size,
            level,
            root,
        })
    }
}

/// Pack an ordered run of level `level - 1` pairs into level-`level` node
/// blocks: up to `arity` pair images per block, zero-padded, encrypted,
/// stored. Output pairs preserve left-to-right order; the last block of a
/// level may be short, its trailing slots left zero.
pub(crate) async fn collect_level<S: BlockStore>(
    store: &S,
    block_size: BlockSize,
    level: u8,
    pairs: &[Pair],
) -> Result<Vec<Pair>> {
    let arity = block_size.arity();
    let mut out = Vec::with_capacity(pairs.len().div_ceil(arity));
    let mut block = vec![0u8; block_size.bytes()];
    for group in pairs.chunks(arity) {
        block.fill(0);
        for (i, pair) in group.iter().enumerate() {
            block[i * PAIR_SIZE..(i + 1) * PAIR_SIZE].copy_from_slice(&pair.to_bytes());
        }
        let node = codec::encrypt_node(&mut block, level)?;
        store
            .put(node.reference(), Bytes::copy_from_slice(&block))
            .await?;
        out.push(node);
    }
    trace!(level, input = pairs.len(), output = out.len(), "node level");
    Ok(out)
}
