// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Throttle and debounce on the virtual clock.
//!
//! Drives a burst of resizes through a debounced measurement and a burst of
//! scrolls through a throttled one, advancing the headless clock by hand.
//!
//! Run:
//! - `cargo run -p understory_measure_demos --example measure_rate_limit`

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use kurbo::{Rect, Vec2};
use understory_measure::headless::{Document, ElementSpec};
use understory_measure::{Debounce, Measure, MeasureOptions, Overflow, OverflowStyle};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn main() {
    env_logger::init();

    let doc = Rc::new(Document::new());
    let pane = doc.insert(
        doc.body(),
        ElementSpec {
            rect: Rect::new(0.0, 0.0, 400.0, 400.0),
            overflow: OverflowStyle::uniform(Overflow::Scroll),
            ..Default::default()
        },
    );
    let el = doc.insert(
        pane,
        ElementSpec {
            rect: Rect::new(0.0, 200.0, 100.0, 300.0),
            ..Default::default()
        },
    );

    println!("== Debounce 50ms: three resizes 10ms apart ==");
    let debounced = {
        let d = doc.clone();
        Measure::new(
            doc.clone(),
            MeasureOptions::default()
                .with_debounce(Debounce::Split {
                    scroll: Duration::ZERO,
                    resize: ms(50),
                })
                .on_resize(move |b| println!("  t={:?} resize → width={}", d.now(), b.width)),
        )
    };
    let _ = debounced.attach(Some(&el));
    for w in [120.0, 140.0, 160.0] {
        println!("  t={:?} set width {w}", doc.now());
        doc.set_rect(el, Rect::new(0.0, 200.0, w, 300.0));
        doc.advance(ms(10));
    }
    doc.advance(ms(100));
    drop(debounced);

    println!("== Throttle 100ms: five scrolls, then one more after 150ms ==");
    let runs = Rc::new(Cell::new(0_u32));
    let throttled = {
        let runs = runs.clone();
        Measure::new(
            doc.clone(),
            MeasureOptions::default()
                .with_scroll(true)
                .with_throttle(ms(100))
                .on_scroll(move |b| {
                    runs.set(runs.get() + 1);
                    println!("  scroll → top={}", b.top);
                }),
        )
    };
    let _ = throttled.attach(Some(&el));
    for _ in 0..5 {
        doc.scroll_by(pane, Vec2::new(0.0, 10.0));
    }
    doc.advance(ms(150));
    doc.scroll_by(pane, Vec2::new(0.0, 10.0));
    println!("  handler ran {} time(s) for 6 scrolls", runs.get());
}
