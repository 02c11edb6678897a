//! Benchmarks for the per-sample hot path.
//!
//! Run with: cargo bench
//!
//! The driver has to render one buffer faster than the transport plays it.
//! Reference deadlines at 44.1kHz:
//!   - 64 frames  = 1.45ms
//!   - 128 frames = 2.90ms
//!   - 256 frames = 5.80ms
//!   - 512 frames = 11.61ms

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use minifm::{
    dsp::{sine_table, Adsr, Envelope, FmOperator},
    FmSynth, SynthConfig, MAX_VOICES,
};

/// Common buffer sizes used in audio applications.
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

const DT: f32 = 1.0 / 44_100.0;

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let adsr = Adsr::new(0.05, 0.3, 0.6, 0.5);

    for &size in BLOCK_SIZES {
        group.bench_with_input(BenchmarkId::new("attack_decay", size), &size, |b, &size| {
            b.iter(|| {
                let mut env = Envelope::default();
                env.trigger();
                for _ in 0..size {
                    env.step(black_box(&adsr), DT);
                }
                black_box(env.level())
            })
        });
    }

    group.finish();
}

fn bench_operator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/fm");
    let table = sine_table();

    for &size in BLOCK_SIZES {
        let mut op = FmOperator::default();
        op.tune(220.0, 768.0);
        op.modulation_index = 512.0;

        group.bench_with_input(BenchmarkId::new("operator", size), &size, |b, &size| {
            b.iter(|| {
                let mut acc = 0.0;
                for _ in 0..size {
                    acc += op.next_sample(table, DT);
                }
                black_box(acc)
            })
        });
    }

    group.finish();
}

fn bench_synth(c: &mut Criterion) {
    let mut group = c.benchmark_group("synth/render");

    for &size in BLOCK_SIZES {
        let mut frames = vec![0u32; size];

        let mut idle = FmSynth::new(SynthConfig::default());
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| idle.render_frames(black_box(&mut frames)))
        });

        let mut single = FmSynth::new(SynthConfig::default());
        single.note_on(0, 60, 100);
        group.bench_with_input(BenchmarkId::new("one_voice", size), &size, |b, _| {
            b.iter(|| single.render_frames(black_box(&mut frames)))
        });

        // Worst case: every slot sounding a sustaining timbre.
        let mut full = FmSynth::new(SynthConfig::default());
        for ch in 0..MAX_VOICES as u8 {
            full.set_instrument(ch, 8); // violin, sustain 0.9
            full.note_on(ch, 48 + ch * 3, 127);
        }
        group.bench_with_input(BenchmarkId::new("full_pool", size), &size, |b, _| {
            b.iter(|| full.render_frames(black_box(&mut frames)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_envelope, bench_operator, bench_synth);
criterion_main!(benches);
