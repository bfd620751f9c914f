// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for folioscan-document: page binarization and
// multi-page assembly on synthetic captures.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use folioscan_document::{Threshold, assemble, process};

/// A reader-sized capture: light background with dark "text" bands.
fn synthetic_capture(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        if (y / 12) % 2 == 0 && x % 9 < 6 {
            Rgb([35, 35, 40])
        } else {
            Rgb([244, 241, 235])
        }
    }))
}

fn bench_binarize(c: &mut Criterion) {
    let capture = synthetic_capture(800, 1100);

    c.bench_function("binarize fixed (800x1100)", |b| {
        b.iter(|| black_box(process(black_box(&capture), Threshold::Fixed(200))));
    });

    c.bench_function("binarize otsu (800x1100)", |b| {
        b.iter(|| black_box(process(black_box(&capture), Threshold::Otsu)));
    });
}

fn bench_assemble(c: &mut Criterion) {
    let pages: Vec<DynamicImage> = (0..8)
        .map(|_| process(&synthetic_capture(400, 550), Threshold::Fixed(200)))
        .collect();

    c.bench_function("assemble 8 pages lossless", |b| {
        b.iter(|| black_box(assemble(black_box(&pages), "Bench", 100)));
    });

    c.bench_function("assemble 8 pages quality 75", |b| {
        b.iter(|| black_box(assemble(black_box(&pages), "Bench", 75)));
    });
}

criterion_group!(benches, bench_binarize, bench_assemble);
criterion_main!(benches);
