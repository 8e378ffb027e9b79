// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Measure: reactive bounds tracking for UI elements.
//!
//! Understory Measure keeps an up-to-date record of where one element sits in
//! the viewport and how large it is, and notifies the application only when
//! that record actually changes.
//!
//! - Watches the element's size through a size observer (native or a supplied polyfill).
//! - Optionally watches every scrollable ancestor, the window, and screen orientation.
//! - Optionally watches the element's subtree for inserted or removed children.
//! - Rate-limits each notification path with a throttle gate and a debounce timer.
//! - Publishes a new [`Bounds`] only when some field differs from the last one.
//!
//! ## Hosts
//!
//! The crate does not talk to a browser or windowing system directly. Every
//! primitive it needs (rect queries, computed overflow, listeners, observers,
//! timers) comes from a [`Host`] implementation. Element handles are the
//! host's own type.
//!
//! The `headless` feature provides `headless::Document`, a deterministic
//! in-memory host with a virtual clock, used by the tests, demos, and
//! benchmarks in this workspace.
//!
//! ## Not a layout engine
//!
//! This crate does not compute layout. It reads whatever geometry the host
//! reports and decides when that geometry is worth publishing.
//!
//! ## API overview
//!
//! - [`Measure`]: one measurement instance; attach it to an element and read [`Measure::bounds`].
//! - [`MeasureOptions`]: debounce, throttle, scroll tracking, offset-size mode, child observation,
//!   callbacks, and the size-observer polyfill.
//! - [`Bounds`]: the published record (`x`, `y`, `width`, `height`, `top`, `right`, `bottom`, `left`).
//! - [`AttachCleanup`]: returned by [`Measure::attach`] when a child watch was installed.
//! - [`Host`]: the environment capability trait.
//!
//! Key operations:
//! - [`Measure::new`] → instance with window listeners registered.
//! - [`Measure::attach`] → swaps every per-element registration to a new element and measures once.
//! - [`Measure::force_refresh`] → measures now; publishes if changed.
//! - [`Measure::teardown`] → removes everything; also runs on drop.
//!
//! ## Degenerate mode
//!
//! When the host has no size observer and no polyfill was given, the instance
//! registers nothing and reports [`Bounds::HEADLESS`] (a 1280×800 viewport at
//! the origin), so code that renders without a live environment still sees
//! plausible dimensions.
//!
//! ## Rate limiting
//!
//! Each path (scroll and resize) is wrapped once, when the instance is
//! created. A throttle gate admits at most one trigger per interval; the
//! triggers it admits are coalesced by the path's debounce delay. Zero
//! durations disable the corresponding stage. See [`schedule`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod error;
pub mod host;
pub mod measure;
pub mod options;
pub mod schedule;
pub mod scroll;
pub mod snapshot;
pub mod types;

#[cfg(any(test, feature = "headless"))]
pub mod headless;

mod listeners;

pub use error::HostError;
pub use host::{
    EventKind, EventTarget, Handler, Host, ListenerId, ListenerOptions, ObserveOptions, Observer,
    ObserverFactory, OrientationSource, SizeObservation, TimerId,
};
pub use measure::{AttachCleanup, Measure};
pub use options::{BoundsCallback, Debounce, MeasureOptions};
pub use schedule::RateLimit;
pub use types::{Bounds, Overflow, OverflowStyle, Trigger};
