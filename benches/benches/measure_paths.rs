// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;
use std::time::Duration;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Rect, Vec2};
use understory_measure::headless::{Document, ElementId, ElementSpec};
use understory_measure::scroll::find_scroll_ancestors;
use understory_measure::{Measure, MeasureOptions, Overflow, OverflowStyle};

/// A chain of `depth` nested elements; every `every`th one scrolls.
fn gen_chain(doc: &Document, depth: usize, every: usize) -> (Vec<ElementId>, ElementId) {
    let mut scrollers = Vec::new();
    let mut parent = doc.body();
    for i in 0..depth {
        let scrolls = every != 0 && i % every == 0;
        let overflow = if scrolls {
            OverflowStyle::uniform(Overflow::Auto)
        } else {
            OverflowStyle::default()
        };
        parent = doc.insert(
            parent,
            ElementSpec {
                rect: Rect::new(0.0, 0.0, 400.0, 4000.0),
                overflow,
                ..Default::default()
            },
        );
        if scrolls {
            scrollers.push(parent);
        }
    }
    let leaf = doc.insert(
        parent,
        ElementSpec {
            rect: Rect::new(0.0, 2000.0, 100.0, 2020.0),
            ..Default::default()
        },
    );
    (scrollers, leaf)
}

fn bench_ancestor_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("ancestor_walk");
    for &depth in &[8usize, 64, 512] {
        let doc = Document::new();
        let (_, leaf) = gen_chain(&doc, depth, 4);
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_function(format!("find_scroll_ancestors_d{}", depth), |b| {
            b.iter(|| black_box(find_scroll_ancestors(&doc, &leaf)).len());
        });
    }
    group.finish();
}

fn bench_attach(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach");
    for &depth in &[8usize, 64] {
        let doc = Rc::new(Document::new());
        let (_, a) = gen_chain(&doc, depth, 2);
        let (_, b) = gen_chain(&doc, depth, 2);
        group.bench_function(format!("swap_targets_d{}", depth), |bench| {
            bench.iter_batched(
                || Measure::new(doc.clone(), MeasureOptions::default().with_scroll(true)),
                |m| {
                    let _ = m.attach(Some(&a));
                    let _ = m.attach(Some(&b));
                    black_box(m.bounds());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");
    let doc = Rc::new(Document::new());
    let (scrollers, leaf) = gen_chain(&doc, 16, 4);
    let outer = scrollers[0];

    let m = Measure::new(
        doc.clone(),
        MeasureOptions::default()
            .with_scroll(true)
            .on_scroll(|b| {
                black_box(b);
            }),
    );
    let _ = m.attach(Some(&leaf));
    group.bench_function("scroll_dispatch_unlimited", |b| {
        let mut dir = 1.0;
        b.iter(|| {
            dir = -dir;
            doc.scroll_by(outer, Vec2::new(0.0, dir));
        });
    });

    group.bench_function("force_refresh_unchanged", |b| {
        b.iter(|| black_box(m.force_refresh()));
    });
    drop(m);

    let throttled = Measure::new(
        doc.clone(),
        MeasureOptions::default()
            .with_scroll(true)
            .with_throttle(Duration::from_millis(16)),
    );
    let _ = throttled.attach(Some(&leaf));
    group.throughput(Throughput::Elements(100));
    group.bench_function("scroll_burst_throttled", |b| {
        b.iter(|| {
            for i in 0..100 {
                let dy = if i % 2 == 0 { 1.0 } else { -1.0 };
                doc.scroll_by(outer, Vec2::new(0.0, dy));
            }
            doc.advance(Duration::from_millis(16));
        });
    });
    group.finish();
}

criterion_group!(benches, bench_ancestor_walk, bench_attach, bench_publish);
criterion_main!(benches);
