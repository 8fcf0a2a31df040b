//! Criterion benchmarks for the radio effect chain
//!
//! Run with: cargo bench
#![allow(missing_docs)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use skywave_core::{Effect, FRAME_SIZE_SAMPLES, SampleSource, silent_frame};
use skywave_effects::{PinkNoiseGenerator, SimpleCompressor, SineToneSource, VhfBandFilter};

const SAMPLE_RATE: f32 = 48000.0;

fn voice_like_frame() -> Vec<f32> {
    (0..FRAME_SIZE_SAMPLES)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_vhf_filter(c: &mut Criterion) {
    let mut filter = VhfBandFilter::new();
    let mut buffer = voice_like_frame();
    c.bench_function("vhf_filter_frame", |b| {
        b.iter(|| {
            filter.process_block_inplace(black_box(&mut buffer));
            black_box(buffer[0])
        })
    });
}

fn bench_compressor(c: &mut Criterion) {
    let mut comp = SimpleCompressor::new(SAMPLE_RATE);
    let mut buffer = voice_like_frame();
    c.bench_function("compressor_frame", |b| {
        b.iter(|| {
            comp.process_block_inplace(black_box(&mut buffer));
            black_box(buffer[0])
        })
    });
}

fn bench_receive_chain(c: &mut Criterion) {
    let mut filter = VhfBandFilter::new();
    let mut comp = SimpleCompressor::new(SAMPLE_RATE);
    let mut buffer = voice_like_frame();
    c.bench_function("filter_then_compressor_frame", |b| {
        b.iter(|| {
            filter.process_block_inplace(black_box(&mut buffer));
            comp.process_block_inplace(black_box(&mut buffer));
            black_box(buffer[0])
        })
    });
}

fn bench_generators(c: &mut Criterion) {
    let mut pink = PinkNoiseGenerator::new();
    let mut tone = SineToneSource::new(180.0);
    let mut frame = silent_frame();
    c.bench_function("pink_noise_frame", |b| {
        b.iter(|| {
            pink.get_frame(black_box(&mut frame));
            black_box(frame[0])
        })
    });
    c.bench_function("block_tone_frame", |b| {
        b.iter(|| {
            tone.get_frame(black_box(&mut frame));
            black_box(frame[0])
        })
    });
}

criterion_group!(
    benches,
    bench_vhf_filter,
    bench_compressor,
    bench_receive_chain,
    bench_generators
);
criterion_main!(benches);
