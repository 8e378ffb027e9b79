// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rate limiting for notification handlers.
//!
//! ## Overview
//!
//! - [`throttle`]: the first call in a window runs at once, later calls in the
//!   same window are dropped, and a host timer reopens the window.
//! - [`debounce`]: every call restarts a host timer; the handler runs once the
//!   delay passes without another call.
//! - [`rate_limited`]: composes both. A trigger passes the throttle gate first
//!   and the surviving calls are coalesced by the debounce timer, so the final
//!   run lands at least one debounce delay after the last accepted call.
//!
//! Wrapped handlers hold only a weak reference to the host. Once the host is
//! dropped they do nothing.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::Cell;
use core::time::Duration;

use crate::host::{Handler, Host, TimerId};
use crate::options::MeasureOptions;
use crate::types::Trigger;

/// Rate-limiting settings for one notification path.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RateLimit {
    /// Throttle interval.
    pub throttle: Option<Duration>,
    /// Debounce delay.
    pub debounce: Option<Duration>,
}

impl RateLimit {
    /// Settings for `trigger` taken from `options`; zero durations count as unset.
    pub fn for_trigger<E>(options: &MeasureOptions<E>, trigger: Trigger) -> Self {
        Self {
            throttle: options.throttle_interval(),
            debounce: options.debounce_delay(trigger),
        }
    }

    /// Returns true when neither throttle nor debounce is set.
    pub fn is_passthrough(&self) -> bool {
        self.throttle.is_none() && self.debounce.is_none()
    }
}

/// Wrap `handler` so at most one call per `interval` gets through.
///
/// The accepted call runs synchronously, inside the triggering call.
pub fn throttle<H: Host>(host: &Rc<H>, interval: Duration, handler: Handler) -> Handler {
    let host: Weak<H> = Rc::downgrade(host);
    let cooling = Rc::new(Cell::new(false));
    Rc::new(move || {
        if cooling.get() {
            return;
        }
        let Some(host) = host.upgrade() else {
            return;
        };
        cooling.set(true);
        let reopen = cooling.clone();
        host.set_timeout(interval, Box::new(move || reopen.set(false)));
        handler();
    })
}

/// Wrap `handler` so it runs once, `delay` after the last call in a burst.
pub fn debounce<H: Host>(host: &Rc<H>, delay: Duration, handler: Handler) -> Handler {
    let host: Weak<H> = Rc::downgrade(host);
    let pending: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
    Rc::new(move || {
        let Some(host) = host.upgrade() else {
            return;
        };
        if let Some(id) = pending.take() {
            host.clear_timeout(id);
        }
        let handler = handler.clone();
        let slot = pending.clone();
        let id = host.set_timeout(
            delay,
            Box::new(move || {
                slot.set(None);
                handler();
            }),
        );
        pending.set(Some(id));
    })
}

/// Apply `limit` to `handler`: throttle gates calls first, debounce coalesces what passes.
///
/// Calls dropped inside the throttle window never reach the debounce stage, so
/// a change made late in the window is picked up only by the next trigger.
///
/// With neither set the handler is returned unchanged.
pub fn rate_limited<H: Host>(host: &Rc<H>, limit: RateLimit, handler: Handler) -> Handler {
    let mut out = handler;
    if let Some(delay) = limit.debounce {
        out = debounce(host, delay, out);
    }
    if let Some(interval) = limit.throttle {
        out = throttle(host, interval, out);
    }
    out
}
