//! Criterion benchmarks for key translation.
//!
//! Measures table lookup for both code spaces and the Set 2 make/break
//! encoding, which run once per key event on the firmware's hot path.
//!
//! Run with:
//! ```bash
//! cargo bench --package hid-bridge-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hid_bridge_core::keymap::{lookup, KeyId, KeyMapper};

// ── Representative key ids ────────────────────────────────────────────────────

/// Common keys plus one unassigned id.
const BENCH_KEY_IDS: &[u8] = &[
    1,   // KeyA
    26,  // KeyZ
    37,  // Enter
    38,  // Escape
    39,  // Backspace
    40,  // Tab
    41,  // Space
    54,  // F1
    65,  // F12
    66,  // PrintScreen
    68,  // Home
    76,  // ArrowUp
    77,  // ControlLeft
    78,  // ShiftLeft
    85,  // Pause
    111, // NonConvert
    0,   // unassigned
];

// ── Benchmarks: table lookup ──────────────────────────────────────────────────

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_lookup");

    group.bench_function("lookup_single", |b| b.iter(|| lookup(black_box(1))));

    group.bench_function("lookup_batch_17", |b| {
        b.iter(|| {
            BENCH_KEY_IDS
                .iter()
                .map(|&id| lookup(black_box(id)))
                .collect::<Vec<_>>()
        })
    });

    group.bench_function("usb_usage_all_ids", |b| {
        b.iter(|| (0..=u8::MAX).filter_map(|id| KeyMapper::usb_usage(black_box(id))).count())
    });

    group.finish();
}

// ── Benchmarks: reverse lookup ────────────────────────────────────────────────

fn bench_reverse_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_reverse");

    // Linear scan; first and last entries bound the cost.
    for (label, usage) in [("KeyA", 0x04u8), ("NonConvert", 0x8B)] {
        group.bench_with_input(BenchmarkId::new("usb_to_key", label), &usage, |b, &u| {
            b.iter(|| KeyMapper::key_for_usb_usage(black_box(u)))
        });
    }

    group.finish();
}

// ── Benchmarks: Set 2 encoding ────────────────────────────────────────────────

fn bench_scan_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_ps2");

    for key in [KeyId::KeyA, KeyId::Home, KeyId::PrintScreen, KeyId::Pause] {
        let entry = hid_bridge_core::keymap::entry_for(key);
        group.bench_with_input(
            BenchmarkId::new("make_and_break", format!("{key:?}")),
            &entry,
            |b, entry| {
                b.iter(|| {
                    let make = black_box(entry).ps2_sequence(true);
                    let brk = black_box(entry).ps2_sequence(false);
                    make.as_slice().len() + brk.as_slice().len()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_reverse_lookup, bench_scan_encoding);
criterion_main!(benches);
