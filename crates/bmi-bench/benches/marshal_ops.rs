//! Criterion micro-benchmarks for copying between engine storage and caller buffers.

use bmi_adapter::marshal::{read_at, read_into, write_from};
use bmi_core::{
    Layout, NativeArray, NativeArrayMut, NativeData, NativeDataMut, ValueSlice, ValueSliceMut,
    WritePolicy,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const NX: usize = 316;
const NY: usize = 316;

/// Benchmark: Read a contiguous f64 array of ~100K elements.
fn bench_read_contiguous_f64(c: &mut Criterion) {
    let storage = vec![1.5f64; NX * NY];
    let mut dest = vec![0.0f64; NX * NY];

    c.bench_function("read_contiguous_f64_100k", |b| {
        b.iter(|| {
            let src = NativeArray::contiguous(NativeData::Float64(&storage));
            read_into(&src, ValueSliceMut::Float64(&mut dest)).unwrap();
            black_box(&dest);
        });
    });
}

/// Benchmark: Read a Fortran-ordered f32 array, widening to f64.
fn bench_read_transposed_widening(c: &mut Criterion) {
    let storage: Vec<f32> = (0..NX * NY).map(|k| k as f32).collect();
    let layout = Layout::column_major(&[NX, NY]).reversed();
    let mut dest = vec![0.0f64; NX * NY];

    c.bench_function("read_transposed_f32_to_f64_100k", |b| {
        b.iter(|| {
            let src = NativeArray::new(NativeData::Float32(&storage), layout.clone()).unwrap();
            read_into(&src, ValueSliceMut::Float64(&mut dest)).unwrap();
            black_box(&dest);
        });
    });
}

/// Benchmark: Read one level of a two-level array (strided view).
fn bench_read_time_level(c: &mut Criterion) {
    let nlinks = NX * NY;
    let storage = vec![2.0f32; nlinks * 2];
    let layout = Layout::column_major(&[nlinks, 2]).select(1, 1).unwrap();
    let mut dest = vec![0.0f64; nlinks];

    c.bench_function("read_time_level_100k", |b| {
        b.iter(|| {
            let src = NativeArray::new(NativeData::Float32(&storage), layout.clone()).unwrap();
            read_into(&src, ValueSliceMut::Float64(&mut dest)).unwrap();
            black_box(&dest);
        });
    });
}

/// Benchmark: Gather 1000 scattered elements from a transposed array.
fn bench_read_at_indices(c: &mut Criterion) {
    let storage: Vec<f32> = (0..NX * NY).map(|k| k as f32).collect();
    let layout = Layout::column_major(&[NX, NY]).reversed();
    let indices: Vec<usize> = (0u64..1000)
        .map(|i| (i.wrapping_mul(6364136223846793007) % (NX * NY) as u64) as usize)
        .collect();
    let mut dest = vec![0.0f64; indices.len()];

    c.bench_function("read_at_1k_indices", |b| {
        b.iter(|| {
            let src = NativeArray::new(NativeData::Float32(&storage), layout.clone()).unwrap();
            read_at(&src, &indices, ValueSliceMut::Float64(&mut dest)).unwrap();
            black_box(&dest);
        });
    });
}

/// Benchmark: Accumulate a f64 field into native f32 storage.
fn bench_write_accumulate_narrowing(c: &mut Criterion) {
    let mut storage = vec![0.0f32; NX * NY];
    let src = vec![1e-3f64; NX * NY];

    c.bench_function("write_accumulate_f64_to_f32_100k", |b| {
        b.iter(|| {
            let mut dst = NativeArrayMut::contiguous(NativeDataMut::Float32(&mut storage));
            write_from(&mut dst, ValueSlice::Float64(&src), WritePolicy::Accumulate).unwrap();
        });
        black_box(&storage);
    });
}

criterion_group!(
    benches,
    bench_read_contiguous_f64,
    bench_read_transposed_widening,
    bench_read_time_level,
    bench_read_at_indices,
    bench_write_accumulate_narrowing,
);
criterion_main!(benches);
