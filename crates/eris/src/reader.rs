//! Random-access stream reader over a capability.
//!
//! The first read walks the tree from the root and materialises the flat,
//! ordered list of leaf pairs; every later operation works off that list.
//! Reads fetch, verify, and decrypt one leaf at a time, so a reader never
//! holds more than one plaintext block.

use tracing::debug;

use crate::block::Pair;
use crate::cap::ErisCap;
use crate::codec;
use crate::error::Result;
use crate::store::BlockStore;
use crate::PAIR_SIZE;

/// Reader over an encoded tree. Positioning is byte-oriented; `seek` past
/// the end is allowed and simply makes the next read return nothing.
pub struct ErisReader<S> {
    store: S,
    cap: ErisCap,
    pos: u64,
    leaves: Option<Vec<Pair>>,
    stopped: bool,
}

impl<S: BlockStore> ErisReader<S> {
    pub fn new(store: S, cap: ErisCap) -> Self {
        Self {
            store,
            cap,
            pos: 0,
            leaves: None,
            stopped: false,
        }
    }

    pub fn cap(&self) -> &ErisCap {
        &self.cap
    }

    /// Current byte position (tell).
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Move the read position. Clears the end-of-stream flag.
    pub fn seek(&mut self, pos: u64) {
        self.pos = pos;
        self.stopped = false;
    }

    /// Content length: full blocks for every leaf but the last, plus the
    /// unpadded tail.
    pub async fn length(&mut self) -> Result<u64> {
        self.ensure_leaves().await?;
        let bs = self.cap.block_size.bytes() as u64;
        let n_leaves = self.leaves.as_ref().map_or(0, Vec::len);
        let last = match self.leaves.as_ref().and_then(|l| l.last()) {
            Some(pair) => pair.clone(),
            None => return Ok(0),
        };
        let block = self.fetch_block(&last, 0).await?;
        let tail = codec::unpad(&block)? as u64;
        Ok((n_leaves as u64 - 1) * bs + tail)
    }

    /// Read up to `buf.len()` bytes from the current position. Returns the
    /// number of bytes copied; 0 means end of stream (until `seek`).
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.stopped || buf.is_empty() {
            return Ok(0);
        }
        self.ensure_leaves().await?;
        let bs = self.cap.block_size.bytes() as u64;
        let n_leaves = self.leaves.as_ref().map_or(0, Vec::len);

        let mut filled = 0;
        while filled < buf.len() {
            let index = (self.pos / bs) as usize;
            if index >= n_leaves {
                self.stopped = true;
                break;
            }
            let offset = (self.pos % bs) as usize;
            let pair = match self.leaves.as_ref().and_then(|l| l.get(index)) {
                Some(pair) => pair.clone(),
                None => break,
            };
            let block = self.fetch_block(&pair, 0).await?;
            let content_len = if index == n_leaves - 1 {
                codec::unpad(&block)?
            } else {
                block.len()
            };
            if offset >= content_len {
                self.stopped = true;
                break;
            }
            let n = (buf.len() - filled).min(content_len - offset);
            buf[filled..filled + n].copy_from_slice(&block[offset..offset + n]);
            filled += n;
            self.pos += n as u64;
        }
        Ok(filled)
    }

    /// Read until `\n` or `\r`. The terminator is consumed but not
    /// included. Returns `None` once no bytes remain before end of stream.
    pub async fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        if self.stopped {
            return Ok(None);
        }
        self.ensure_leaves().await?;
        let bs = self.cap.block_size.bytes() as u64;
        let n_leaves = self.leaves.as_ref().map_or(0, Vec::len);

        let mut line = Vec::new();
        loop {
            let index = (self.pos / bs) as usize;
            if index >= n_leaves {
                self.stopped = true;
                break;
            }
            let offset = (self.pos % bs) as usize;
            let pair = match self.leaves.as_ref().and_then(|l| l.get(index)) {
                Some(pair) => pair.clone(),
                None => break,
            };
            let block = self.fetch_block(&pair, 0).await?;
            let content_len = if index == n_leaves - 1 {
                codec::unpad(&block)?
            } else {
                block.len()
            };
            if offset >= content_len {
                self.stopped = true;
                break;
            }
            let span = &block[offset..content_len];
            match span.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(k) => {
                    line.extend_from_slice(&span[..k]);
                    self.pos += k as u64 + 1;
                    return Ok(Some(line));
                }
                None => {
                    line.extend_from_slice(span);
                    self.pos += span.len() as u64;
                }
            }
        }
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    /// Walk the tree from the root and flatten it into the ordered leaf
    /// list. Absent trailing pairs (all-zero 64-byte slots) terminate each
    /// node; the encoder never emits a zero pair before a present one.
    async fn ensure_leaves(&mut self) -> Result<()> {
        if self.leaves.is_some() {
            return Ok(());
        }
        let mut leaves = Vec::new();
        let mut stack = vec![(self.cap.root.clone(), self.cap.level)];
        while let Some((pair, level)) = stack.pop() {
            if level == 0 {
                leaves.push(pair);
                continue;
            }
            let block = self.fetch_block(&pair, level).await?;
            let present = block
                .chunks_exact(PAIR_SIZE)
                .take_while(|slot| slot.iter().any(|&b| b != 0));
            let children: Vec<Pair> = present
                .map(|slot| {
                    let mut image = [0u8; PAIR_SIZE];
                    image.copy_from_slice(slot);
                    Pair::from_bytes(&image)
                })
                .collect();
            for child in children.into_iter().rev() {
                stack.push((child, level - 1));
            }
        }
        debug!(level = self.cap.level, leaves = leaves.len(), "materialised leaf list");
        self.leaves = Some(leaves);
        Ok(())
    }

    async fn fetch_block(&self, pair: &Pair, level: u8) -> Result<Vec<u8>> {
        let bytes = self.store.get(pair.reference()).await?;
        let mut block = bytes.to_vec();
        codec::decrypt_block(&mut block, pair, level)?;
        Ok(block)
    }
}
