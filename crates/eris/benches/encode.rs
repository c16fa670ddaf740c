use eris::{decode, encode, BlockSize, MemoryStore, Secret};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().build().unwrap()
}

#[divan::bench(args = [64 * 1024, 1024 * 1024])]
fn bench_encode_1kib_blocks(bencher: divan::Bencher, size: usize) {
    let rt = runtime();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            let store = MemoryStore::new();
            rt.block_on(encode(
                &store,
                divan::black_box(&data),
                BlockSize::Kib1,
                Secret::zero(),
            ))
            .unwrap()
        });
}

#[divan::bench(args = [64 * 1024, 1024 * 1024])]
fn bench_encode_32kib_blocks(bencher: divan::Bencher, size: usize) {
    let rt = runtime();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            let store = MemoryStore::new();
            rt.block_on(encode(
                &store,
                divan::black_box(&data),
                BlockSize::Kib32,
                Secret::zero(),
            ))
            .unwrap()
        });
}

#[divan::bench(args = [64 * 1024, 1024 * 1024])]
fn bench_decode_1kib_blocks(bencher: divan::Bencher, size: usize) {
    let rt = runtime();
    let data = make_data(size);
    let store = MemoryStore::new();
    let cap = rt
        .block_on(encode(&store, &data, BlockSize::Kib1, Secret::zero()))
        .unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| rt.block_on(decode(&store, divan::black_box(&cap))).unwrap());
}

fn main() {
    divan::main();
}
