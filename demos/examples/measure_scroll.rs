// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll tracking.
//!
//! Builds a list inside a scrolling panel, attaches to one row, and scrolls
//! the panel and the window. Each scroll moves the row without resizing it,
//! so only the scroll listeners can notice.
//!
//! Run:
//! - `cargo run -p understory_measure_demos --example measure_scroll`

use std::rc::Rc;

use kurbo::{Rect, Vec2};
use understory_measure::headless::{Document, ElementSpec};
use understory_measure::{Measure, MeasureOptions, Overflow, OverflowStyle};

fn main() {
    env_logger::init();

    let doc = Rc::new(Document::new());
    let panel = doc.insert(
        doc.body(),
        ElementSpec {
            rect: Rect::new(0.0, 100.0, 300.0, 400.0),
            overflow: OverflowStyle {
                overflow_y: Overflow::Auto,
                ..Default::default()
            },
            ..Default::default()
        },
    );
    let list = doc.insert(
        panel,
        ElementSpec {
            rect: Rect::new(0.0, 100.0, 300.0, 1100.0),
            ..Default::default()
        },
    );
    let rows: Vec<_> = (0..20)
        .map(|i| {
            let y = 100.0 + f64::from(i) * 50.0;
            doc.insert(
                list,
                ElementSpec {
                    rect: Rect::new(0.0, y, 300.0, y + 40.0),
                    ..Default::default()
                },
            )
        })
        .collect();
    let row = rows[12];

    let m = Measure::new(
        doc.clone(),
        MeasureOptions::default()
            .with_scroll(true)
            .on_scroll(|b| println!("  scroll → top={} bottom={}", b.top, b.bottom)),
    );
    let _ = m.attach(Some(&row));
    println!("== Row 12 at top={} ==", m.bounds().top);
    println!("  watching {} scroll container(s)", m.scroll_ancestors().len());

    println!("== Scroll the panel down 200 ==");
    doc.scroll_by(panel, Vec2::new(0.0, 200.0));

    println!("== Scroll the panel down 250 more ==");
    doc.scroll_by(panel, Vec2::new(0.0, 250.0));

    println!("== Scroll the window down 80 ==");
    doc.scroll_window(Vec2::new(0.0, 80.0));

    println!("== Rotate the screen ==");
    doc.rotate();
    println!("  (no movement, nothing published)");

    println!("== Swap to row 3 ==");
    let _ = m.attach(Some(&rows[3]));
    println!("  top={}", m.bounds().top);
}
