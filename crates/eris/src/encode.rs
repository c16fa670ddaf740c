//! Single-shot encode and decode over the ingest engine and stream reader.

use crate::block::{BlockSize, Secret};
use crate::cap::ErisCap;
use crate::error::Result;
use crate::ingest::Ingest;
use crate::reader::ErisReader;
use crate::store::BlockStore;

/// Encode `content` into `store` and return its read capability.
pub async fn encode<S: BlockStore>(
    store: &S,
    content: &[u8],
    block_size: BlockSize,
    secret: Secret,
) -> Result<ErisCap> {
    let mut ingest = Ingest::new(store, block_size, secret);
    ingest.append(content).await?;
    ingest.cap().await
}

/// Decode the full content behind `cap` from `store`.
pub async fn decode<S: BlockStore>(store: &S, cap: &ErisCap) -> Result<Vec<u8>> {
    let mut reader = ErisReader::new(store, cap.clone());
    let length = reader.length().await? as usize;
    let mut out = vec![0u8; length];
    let mut filled = 0;
    while filled < length {
        let n = reader.read(&mut out[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    out.truncate(filled);
    Ok(out)
}
