// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measure basics.
//!
//! Attaches a measurement to one element of a headless document, resizes and
//! moves it, and prints which changes were published and why.
//!
//! Run:
//! - `cargo run -p understory_measure_demos --example measure_basics`
//! - `RUST_LOG=understory_measure=trace cargo run -p understory_measure_demos --example measure_basics`

use std::rc::Rc;

use kurbo::{Rect, Size};
use understory_measure::headless::{Capabilities, Document, ElementSpec};
use understory_measure::{Bounds, Measure, MeasureOptions};

fn show(label: &str, b: Bounds) {
    println!(
        "  {label:<8} x={:<6} y={:<6} {}x{}",
        b.x, b.y, b.width, b.height
    );
}

fn main() {
    env_logger::init();

    let doc = Rc::new(Document::new());
    let card = doc.insert(
        doc.body(),
        ElementSpec {
            rect: Rect::new(40.0, 80.0, 340.0, 280.0),
            ..Default::default()
        },
    );

    let m = Measure::new(
        doc.clone(),
        MeasureOptions::default()
            .on_change(|b| show("change", b))
            .on_resize(|b| show("resize", b)),
    );

    println!("== Attach ==");
    let _ = m.attach(Some(&card));

    println!("== Grow to 400 wide (size observer) ==");
    doc.set_rect(card, Rect::new(40.0, 80.0, 440.0, 280.0));

    println!("== Move without resizing (nothing observes this) ==");
    doc.set_rect(card, Rect::new(60.0, 80.0, 460.0, 280.0));
    show("stale", m.bounds());

    println!("== Force a refresh ==");
    match m.force_refresh() {
        Some(b) => show("fresh", b),
        None => println!("  unchanged"),
    }
    println!("  second refresh published: {}", m.force_refresh().is_some());

    println!("== Resize the window ==");
    doc.resize_window(Size::new(1024.0, 768.0));
    println!("  (same element bounds, so nothing is published)");

    println!("== Host without a size observer ==");
    let bare = Rc::new(Document::with_capabilities(Capabilities::empty()));
    let degenerate = Measure::new(bare.clone(), MeasureOptions::default());
    let _ = degenerate.attach(Some(&bare.body()));
    println!("  degenerate: {}", degenerate.is_degenerate());
    show("headless", degenerate.bounds());

    m.teardown();
    println!("== Torn down; listeners left: {} ==", doc.listener_count());
}
