//! End-to-end properties of the encode/decode pipeline.

use eris::{decode, encode, BlockSize, ErisCap, Ingest, MemoryStore, Secret};
use proptest::collection::vec;
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime")
}

/// Expected root level for a leaf count: 0 for a single leaf, otherwise the
/// number of arity-fold reductions needed to reach one pair.
fn expected_level(n_leaves: u64, block_size: BlockSize) -> u8 {
    let arity = block_size.arity() as u64;
    let mut level = 0u8;
    let mut span = 1u64;
    while span < n_leaves {
        span *= arity;
        level += 1;
    }
    level
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn round_trip_convergence_and_level(
        data in vec(any::<u8>(), 0..=6000),
        large_blocks in any::<bool>(),
        salt in any::<u8>(),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let block_size = if large_blocks { BlockSize::Kib32 } else { BlockSize::Kib1 };
            let secret = Secret::from_bytes([salt; 32]);

            let store = MemoryStore::new();
            let cap = encode(&store, &data, block_size, secret.clone()).await.unwrap();
            assert_eq!(decode(&store, &cap).await.unwrap(), data, "round trip");

            // Every encode of the same (content, block size, secret) triple
            // yields the same URN, even into a fresh store.
            let other = MemoryStore::new();
            let again = encode(&other, &data, block_size, secret).await.unwrap();
            assert_eq!(cap.urn(), again.urn(), "convergence");

            // URN text codec is lossless in both directions.
            let parsed = ErisCap::from_urn(&cap.urn()).unwrap();
            assert_eq!(parsed, cap);
            assert_eq!(parsed.urn(), cap.urn());

            // Content always gets a padding leaf, so the leaf count is
            // floor(len / bs) + 1.
            let n_leaves = data.len() as u64 / block_size.bytes() as u64 + 1;
            assert_eq!(cap.level, expected_level(n_leaves, block_size), "level bound");
        });
    }

    #[test]
    fn cap_is_idempotent_under_any_partition(
        (data, split) in vec(any::<u8>(), 0..=6000)
            .prop_flat_map(|d| { let len = d.len(); (Just(d), 0..=len) }),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let (a, b) = data.split_at(split);
            let store = MemoryStore::new();

            let mut split_ingest = Ingest::new(store.clone(), BlockSize::Kib1, Secret::zero());
            split_ingest.append(a).await.unwrap();
            let mid = split_ingest.cap().await.unwrap();
            split_ingest.append(b).await.unwrap();
            let split_cap = split_ingest.cap().await.unwrap();

            let mut whole_ingest = Ingest::new(store.clone(), BlockSize::Kib1, Secret::zero());
            whole_ingest.append(&data).await.unwrap();
            let whole_cap = whole_ingest.cap().await.unwrap();

            assert_eq!(split_cap, whole_cap);

            // The mid-stream capability is itself valid for the prefix.
            assert_eq!(decode(&store, &mid).await.unwrap(), a);
        });
    }
}

#[tokio::test]
async fn cbor_and_urn_agree_on_payload() {
    let store = MemoryStore::new();
    let cap = encode(&store, b"wire form", BlockSize::Kib1, Secret::zero())
        .await
        .unwrap();
    let cbor = cap.to_cbor().unwrap();
    assert_eq!(ErisCap::from_cbor(&cbor).unwrap(), cap);
    assert_eq!(ErisCap::from_cbor(&cbor).unwrap().urn(), cap.urn());
}
