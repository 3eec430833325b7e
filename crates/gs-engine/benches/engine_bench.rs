use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use gs_engine::{Chip, Engine, Register, VBI_COUNT};
use gs_format::{load_song, SongBuilder, TableKind};

const END: u8 = 0xFF;

/// Three channels of arpeggiated pulse and saw with pulse modulation.
fn busy_song() -> Arc<gs_format::Song> {
    let bytes = SongBuilder::new()
        .name("bench")
        .subtune([vec![0, END, 0], vec![0xF5, 0, END, 0], vec![0xE9, 0, END, 0]])
        .instrument("Pulse", [0x09, 0xA4, 1, 1, 0, 0, 0, 0, 0])
        .instrument("Saw", [0x00, 0xF6, 4, 1, 0, 0, 0, 0, 0])
        .table(
            TableKind::Wave,
            &[(0x41, 0x80), (0x41, 0x04), (END, 1), (0x21, 0x80), (0x20, 0x0C), (END, 4)],
        )
        .table(TableKind::Pulse, &[(0x84, 0x00), (0x20, 0x20), (0x20, 0xE0), (END, 2)])
        .pattern_with_end(
            (0..32u8)
                .map(|row| {
                    let note = 0x80 + (row % 12);
                    let instrument = if row % 4 == 0 { 2 } else { 1 };
                    if row % 8 == 7 {
                        [0xBE, 0, 0, 0]
                    } else {
                        [note, instrument, 0, 0]
                    }
                })
                .collect(),
        )
        .build();
    Arc::new(load_song(&bytes).expect("bench song loads"))
}

fn bench_chip(c: &mut Criterion) {
    let mut chip = Chip::new();
    for voice in 0..3 {
        chip.write_register(voice, Register::Frequency, 0x1d46 + voice as u16 * 0x400);
        chip.write_register(voice, Register::AttackDecay, 0x00);
        chip.write_register(voice, Register::SustainRelease, 0xF0);
        chip.write_register(voice, Register::PulseWidth, 0x800);
        chip.write_register(voice, Register::Control, [0x41, 0x21, 0x11][voice]);
    }
    c.bench_function("chip_frame", |b| {
        b.iter(|| {
            for _ in 0..VBI_COUNT {
                black_box(chip.next_sample());
            }
        })
    });
}

fn bench_engine(c: &mut Criterion) {
    let song = busy_song();
    let mut engine = Engine::new(song, 0).expect("subtune 0 exists");
    let mut out = Vec::with_capacity(VBI_COUNT as usize);
    c.bench_function("engine_frame", |b| {
        b.iter(|| {
            out.clear();
            for _ in 0..VBI_COUNT {
                let _ = engine.step(&mut out);
            }
            black_box(out.len())
        })
    });
    c.bench_function("sequencer_tick", |b| b.iter(|| black_box(engine.tick_sequencer())));
}

criterion_group!(benches, bench_chip, bench_engine);
criterion_main!(benches);
