//! Processor Benchmarks
//!
//! Per-block cost of the audio callback path.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gainknob::dsp::compute_coefficients;
use gainknob::engine::generate_test_tone;
use gainknob::{AudioBuffer, GainKnobProcessor, ParameterStore};

fn stereo_tone(frames: usize) -> AudioBuffer {
    let mut tone = generate_test_tone(400.0, 1.0, 48000, 2, 0.5);
    for channel in tone.samples.iter_mut() {
        channel.truncate(frames);
    }
    tone
}

fn benchmark_planar_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_planar");
    for block_size in [64usize, 512, 2048] {
        let params = Arc::new(ParameterStore::with_values(4.0, 6.0));
        let mut processor = GainKnobProcessor::new(params);
        processor.prepare(48000.0, block_size, 2).unwrap();
        let source = stereo_tone(block_size);
        let mut block = source.clone();

        group.bench_with_input(BenchmarkId::from_parameter(block_size), &block_size, |b, _| {
            b.iter(|| {
                block.samples.clone_from(&source.samples);
                processor.process(black_box(&mut block));
            })
        });
    }
    group.finish();
}

fn benchmark_interleaved_block(c: &mut Criterion) {
    let params = Arc::new(ParameterStore::with_values(4.0, 6.0));
    let mut processor = GainKnobProcessor::new(params);
    processor.prepare(48000.0, 512, 2).unwrap();
    let source = stereo_tone(512).to_interleaved();
    let mut data = source.clone();

    c.bench_function("process_interleaved_512", |b| {
        b.iter(|| {
            data.copy_from_slice(&source);
            processor.process_interleaved(black_box(&mut data), 2, 512);
        })
    });
}

fn benchmark_parameter_churn(c: &mut Criterion) {
    let params = Arc::new(ParameterStore::new());
    let mut processor = GainKnobProcessor::new(Arc::clone(&params));
    processor.prepare(48000.0, 512, 2).unwrap();
    let source = stereo_tone(512);
    let mut block = source.clone();
    let mut boost = 0.0_f32;

    // Every block sees a new boost, forcing a coefficient regeneration.
    c.bench_function("process_512_boost_changing", |b| {
        b.iter(|| {
            boost = if boost >= 10.0 { 0.0 } else { boost + 0.5 };
            params.set_eq_boost(boost);
            block.samples.clone_from(&source.samples);
            processor.process(black_box(&mut block));
        })
    });
}

fn benchmark_coefficients(c: &mut Criterion) {
    c.bench_function("compute_coefficients", |b| {
        b.iter(|| compute_coefficients(black_box(48000.0), black_box(6.0)))
    });
}

criterion_group!(
    benches,
    benchmark_planar_blocks,
    benchmark_interleaved_block,
    benchmark_parameter_churn,
    benchmark_coefficients
);
criterion_main!(benches);
