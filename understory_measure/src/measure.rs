// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The measurement instance: attachment point, publishing, and teardown.
//!
//! ## Lifecycle
//!
//! 1) [`Measure::new`] resolves the size-observation capability, builds the
//!    rate-limited resize and scroll handlers, and registers the window-level
//!    scroll and resize listeners.
//! 2) [`Measure::attach`] points the instance at an element. Swapping to a new
//!    element tears every per-element registration down before the new ones
//!    are installed, then measures once.
//! 3) Observers and listeners fire, the handlers recompute, and a record that
//!    differs from the last published one is published.
//! 4) [`Measure::teardown`] (or dropping the instance) removes everything.
//!    Timers already armed may still fire; their publish is dropped.
//!
//! ## Degenerate mode
//!
//! Without a native size observer and without a polyfill nothing is
//! registered, [`Measure::bounds`] reports [`Bounds::HEADLESS`], and
//! [`Measure::attach`] / [`Measure::force_refresh`] do nothing.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use log::{debug, trace, warn};

use crate::host::{
    EventKind, EventTarget, Handler, Host, ListenerId, ListenerOptions, SizeObservation,
};
use crate::listeners::{Handlers, ObservationState};
use crate::options::MeasureOptions;
use crate::schedule::{RateLimit, rate_limited};
use crate::snapshot::{changed, snapshot};
use crate::types::{Bounds, Trigger};

/// Tracks the bounds of one element at a time.
///
/// See the [module docs](self) for the lifecycle.
pub struct Measure<H: Host> {
    inner: Rc<Inner<H>>,
}

struct Inner<H: Host> {
    host: Rc<H>,
    options: MeasureOptions<H::Element>,
    sizes: SizeObservation<H::Element>,
    handlers: Handlers,
    state: RefCell<ObservationState<H::Element>>,
    bounds: Cell<Bounds>,
    mounted: Cell<bool>,
    window_listeners: RefCell<Vec<ListenerId>>,
}

impl<H: Host> core::fmt::Debug for Measure<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Measure")
            .field("bounds", &self.inner.bounds.get())
            .field("mounted", &self.inner.mounted.get())
            .field("sizes", &self.inner.sizes)
            .field("state", &self.inner.state.borrow())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Measure<H> {
    /// Create a measurement on `host`.
    ///
    /// Registers the window scroll and resize listeners unless the host lacks
    /// size observation (see [degenerate mode](self#degenerate-mode)).
    pub fn new(host: Rc<H>, mut options: MeasureOptions<H::Element>) -> Self {
        let sizes = SizeObservation::resolve(&*host, options.polyfill.take());
        let resize_limit = RateLimit::for_trigger(&options, Trigger::Resize);
        let scroll_limit = RateLimit::for_trigger(&options, Trigger::Scroll);

        let inner = Rc::new_cyclic(|weak: &Weak<Inner<H>>| {
            let handlers = Handlers {
                resize: rate_limited(&host, resize_limit, publisher(weak, Trigger::Resize)),
                scroll: rate_limited(&host, scroll_limit, publisher(weak, Trigger::Scroll)),
            };
            let bounds = if sizes.is_available() {
                Bounds::ZERO
            } else {
                Bounds::HEADLESS
            };
            Inner {
                host: host.clone(),
                options,
                sizes,
                handlers,
                state: RefCell::new(ObservationState::default()),
                bounds: Cell::new(bounds),
                mounted: Cell::new(true),
                window_listeners: RefCell::new(Vec::new()),
            }
        });

        if inner.sizes.is_available() {
            debug!(
                "measure created ({:?} size observation, resize {:?}, scroll {:?})",
                inner.sizes, resize_limit, scroll_limit
            );
            inner.register_window_listeners();
        } else {
            debug!("no size observation available; reporting fixed headless bounds");
        }

        Self { inner }
    }

    /// Attach to `element`, replacing the current target.
    ///
    /// Does nothing for `None`, for the element already attached, in
    /// degenerate mode, and after teardown. Otherwise the previous element's
    /// registrations are removed, scroll ancestors are discovered, new
    /// registrations are installed, and bounds are measured once.
    ///
    /// When `observe_children` is enabled and a child watch was installed, the
    /// returned [`AttachCleanup`] disconnects it. The hosting lifecycle should
    /// run it when `element` is detached or replaced; the next attach or
    /// teardown disconnects it too.
    pub fn attach(&self, element: Option<&H::Element>) -> Option<AttachCleanup<H>> {
        let element = element?;
        let inner = &self.inner;
        let sizes = inner.sizes.factory()?;
        if !inner.mounted.get() {
            return None;
        }
        if inner.state.borrow().target.as_ref() == Some(element) {
            return None;
        }

        let host = &*inner.host;
        let (watching, epoch) = {
            let mut state = inner.state.borrow_mut();
            state.detach(host);
            state.unwatch_children();
            state.scroll_ancestors = crate::scroll::find_scroll_ancestors(host, element);
            state.target = Some(element.clone());
            state.epoch += 1;
            state.attach(host, sizes, &inner.handlers, inner.options.scroll);
            let watching = inner.options.observe_children
                && state.watch_children(host, inner.handlers.resize.clone());
            (watching, state.epoch)
        };

        inner.publish(None);

        watching.then(|| AttachCleanup {
            inner: Rc::downgrade(&self.inner),
            epoch,
        })
    }

    /// The most recently published bounds.
    pub fn bounds(&self) -> Bounds {
        self.inner.bounds.get()
    }

    /// Measure the attached element now and publish if anything changed.
    ///
    /// Returns the newly published record, or `None` when nothing changed, no
    /// element is attached, or the instance is degenerate or torn down.
    pub fn force_refresh(&self) -> Option<Bounds> {
        if !self.inner.sizes.is_available() {
            return None;
        }
        self.inner.publish(None)
    }

    /// Remove every registration and stop publishing. Idempotent.
    pub fn teardown(&self) {
        let inner = &self.inner;
        if !inner.mounted.replace(false) {
            return;
        }
        let host = &*inner.host;
        {
            let mut state = inner.state.borrow_mut();
            state.detach(host);
            state.unwatch_children();
            state.target = None;
            state.scroll_ancestors.clear();
        }
        for id in inner.window_listeners.borrow_mut().drain(..) {
            host.remove_event_listener(id);
        }
        debug!("measure torn down");
    }

    /// The attached element, if any.
    pub fn target(&self) -> Option<H::Element> {
        self.inner.state.borrow().target.clone()
    }

    /// Scroll containers being watched for the attached element, nearest first.
    pub fn scroll_ancestors(&self) -> Vec<H::Element> {
        self.inner.state.borrow().scroll_ancestors.clone()
    }

    /// The resolved size-observation capability.
    pub fn size_observation(&self) -> &SizeObservation<H::Element> {
        &self.inner.sizes
    }

    /// Returns true when no size observation is available.
    pub fn is_degenerate(&self) -> bool {
        !self.inner.sizes.is_available()
    }

    /// Returns false once [`teardown`](Self::teardown) has run.
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }
}

impl<H: Host> Drop for Measure<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Disconnects the child watch installed by one [`Measure::attach`] call.
#[must_use = "run the cleanup when the element is detached"]
pub struct AttachCleanup<H: Host> {
    inner: Weak<Inner<H>>,
    epoch: u64,
}

impl<H: Host> AttachCleanup<H> {
    /// Disconnect the child watch if it still belongs to the attached element.
    pub fn run(self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.state.borrow_mut();
        if state.epoch == self.epoch {
            state.unwatch_children();
        }
    }

    /// Returns true while this cleanup's child watch is still installed.
    pub fn is_active(&self) -> bool {
        self.inner.upgrade().is_some_and(|inner| {
            let state = inner.state.borrow();
            state.epoch == self.epoch && state.is_watching_children()
        })
    }
}

impl<H: Host> core::fmt::Debug for AttachCleanup<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AttachCleanup")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

/// Unthrottled handler for one path; holds the instance weakly.
fn publisher<H: Host>(weak: &Weak<Inner<H>>, trigger: Trigger) -> Handler {
    let weak = weak.clone();
    Rc::new(move || {
        if let Some(inner) = weak.upgrade() {
            inner.publish(Some(trigger));
        }
    })
}

impl<H: Host> Inner<H> {
    fn register_window_listeners(&self) {
        let scroll = self.options.scroll;
        let on_scroll = self.handlers.scroll.clone();
        let window_scroll: Handler = Rc::new(move || {
            if scroll {
                on_scroll();
            }
        });
        let registrations = [
            (
                EventKind::Scroll,
                ListenerOptions::CAPTURE | ListenerOptions::PASSIVE,
                window_scroll,
            ),
            (
                EventKind::Resize,
                ListenerOptions::empty(),
                self.handlers.resize.clone(),
            ),
        ];
        let mut ids = self.window_listeners.borrow_mut();
        for (kind, options, handler) in registrations {
            match self
                .host
                .add_event_listener(EventTarget::Window, kind, options, handler)
            {
                Ok(id) => ids.push(id),
                Err(err) => warn!("window {kind:?} listener failed: {err}"),
            }
        }
    }

    /// Measure the target and publish when the record changed.
    ///
    /// `trigger` selects the path callback; `None` runs only `on_change`.
    fn publish(&self, trigger: Option<Trigger>) -> Option<Bounds> {
        if !self.mounted.get() {
            trace!("dropping {trigger:?} update after teardown");
            return None;
        }
        let target = self.state.borrow().target.clone()?;
        let next = match snapshot(&*self.host, &target, self.options.offset_size) {
            Ok(next) => next,
            Err(err) => {
                debug!("cannot measure {target:?}: {err}");
                return None;
            }
        };
        let Some(next) = changed(&self.bounds.get(), next) else {
            trace!("{trigger:?} update for {target:?} unchanged");
            return None;
        };
        self.bounds.set(next);
        trace!("{trigger:?} published {next:?}");

        if let Some(f) = &self.options.on_change {
            f(next);
        }
        // `on_change` may have torn the instance down.
        if !self.mounted.get() {
            return Some(next);
        }
        if let Some(trigger) = trigger {
            if let Some(f) = self.options.callback(trigger) {
                // The scroll path reports whatever is published now, which a
                // nested callback may already have replaced.
                let reported = match trigger {
                    Trigger::Resize => next,
                    Trigger::Scroll => self.bounds.get(),
                };
                f(reported);
            }
        }
        Some(next)
    }
}
