//! Benchmarks for yEnc encoding and multipart framing
//!
//! Encoding runs once per posted part, so its throughput bounds how fast a
//! probe can upload.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nntp_sla::yenc::{Encoder, decode_body, encode_buffer};
use nntp_sla::{MultipartWriter, YencConfig};

const SIZES: [usize; 4] = [1_024, 102_400, 768_000, 10_240_000];

/// Every byte value, so each escape rule is hit
fn sample(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

fn bench_yenc_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("yenc_encode");

    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        let data = sample(size);
        let mut encoder = Encoder::new(128).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}KB", size / 1024)),
            &size,
            |b, _| {
                b.iter(|| encoder.encode_to_vec(black_box(&data)));
            },
        );
    }

    group.finish();
}

fn bench_yenc_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("yenc_decode");

    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        let encoded = encode_buffer(&sample(size), 128).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}KB", size / 1024)),
            &size,
            |b, _| {
                b.iter(|| decode_body(black_box(&encoded)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_multipart_split(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let data = sample(10_240_000);

    let mut group = c.benchmark_group("multipart_split");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("10000KB", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut writer = MultipartWriter::new("bench.bin", YencConfig::default()).unwrap();
                writer.write(black_box(&data)).unwrap();
                let mut out = Vec::with_capacity(data.len() + data.len() / 20);
                while writer.encode_part(&mut out).await.unwrap().is_some() {
                    out.clear();
                }
                writer.close().unwrap();
            })
        });
    });
    group.finish();
}

criterion_group!(benches, bench_yenc_encode, bench_yenc_decode, bench_multipart_split);
criterion_main!(benches);
