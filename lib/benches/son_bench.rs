use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use son::Son;
use std::io::Cursor;

/// Build a document with `n_channels` objects, each holding a sample array
/// of `samples` readings plus a few scalar fields.
fn build_document(n_channels: usize, samples: usize) -> Vec<u8> {
    let mut son = Son::new(4);
    son.create(Cursor::new(Vec::new())).unwrap();
    son.open_obj("root").unwrap();
    son.write("device", "stratify").unwrap();
    for c in 0..n_channels {
        son.open_obj(&format!("ch{c}")).unwrap();
        son.write("gain", 1.0f32 + c as f32).unwrap();
        son.write("unit", "mV").unwrap();
        son.open_array("samples", 0).unwrap();
        for s in 0..samples {
            son.write("", (s * c) as u32).unwrap();
        }
        son.close_array().unwrap();
        son.close_obj().unwrap();
    }
    son.close_obj().unwrap();
    son.close(false).unwrap().into_inner()
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    for &(channels, samples) in &[(8usize, 64usize), (32, 256)] {
        group.throughput(Throughput::Elements((channels * samples) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{channels}x{samples}")),
            &(channels, samples),
            |b, &(channels, samples)| b.iter(|| build_document(channels, samples)),
        );
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let bytes = build_document(32, 256);
    let mut son = Son::new(4);
    son.open(Cursor::new(bytes)).unwrap();
    let mut group = c.benchmark_group("lookup");
    group.bench_function("first_channel", |b| {
        b.iter(|| son.read_unum("ch0.samples[10]").unwrap())
    });
    group.bench_function("last_channel", |b| {
        b.iter(|| son.read_unum("ch31.samples[255]").unwrap())
    });
    group.bench_function("missing", |b| {
        b.iter(|| son.read_unum("nope").is_err())
    });
    group.finish();
}

fn bench_json(c: &mut Criterion) {
    let bytes = build_document(8, 64);
    let mut son = Son::new(4);
    son.open(Cursor::new(bytes)).unwrap();
    c.bench_function("to_json", |b| b.iter(|| son.to_json_string().unwrap()));
}

criterion_group!(benches, bench_write, bench_lookup, bench_json);
criterion_main!(benches);
