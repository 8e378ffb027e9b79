// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host capabilities consumed by the measurement engine.
//!
//! ## Overview
//!
//! The engine never talks to a platform directly. A [`Host`] supplies element
//! geometry, computed overflow styles, the parent chain, observer factories,
//! event registration, and timers. A browser binding, a retained-mode toolkit,
//! or the in-memory `headless::Document` can all implement it.
//!
//! ## Handles
//!
//! Registration returns a handle ([`ListenerId`], [`TimerId`], or a boxed
//! [`Observer`]) and only that handle unregisters. The engine never relies on
//! comparing callbacks.
//!
//! ## Reentrancy
//!
//! Hosts must not invoke a callback synchronously from inside the call that
//! registered it (`add_event_listener`, `set_timeout`, [`Observer::observe`]).
//! Callbacks may freely call back into the host when they do run.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt::Debug;
use core::time::Duration;

use kurbo::{Rect, Size};

use crate::error::HostError;
use crate::types::OverflowStyle;

/// A callback registered with a host.
pub type Handler = Rc<dyn Fn()>;

/// Handle for a registered event listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a host-assigned identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The host-assigned identifier.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle for a pending timer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a host-assigned identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The host-assigned identifier.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Where an event listener is installed.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventTarget<E> {
    /// The top-level window.
    Window,
    /// A document element.
    Element(E),
    /// The dedicated screen-orientation object.
    ScreenOrientation,
}

/// Event kinds the engine listens for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventKind {
    /// `scroll`
    Scroll,
    /// `resize`
    Resize,
    /// `change`, emitted by the screen-orientation object.
    Change,
    /// Legacy window-level `orientationchange`.
    OrientationChange,
}

bitflags::bitflags! {
    /// Event listener options.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ListenerOptions: u8 {
        /// Listen during the capture phase, so events on descendants are seen too.
        const CAPTURE = 0b0000_0001;
        /// The listener never cancels the event.
        const PASSIVE = 0b0000_0010;
    }
}

bitflags::bitflags! {
    /// What an [`Observer`] watches on its target.
    ///
    /// Size observers are observed with the empty set.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ObserveOptions: u8 {
        /// Report insertion and removal of children.
        const CHILD_LIST = 0b0000_0001;
        /// Extend the watch to every descendant.
        const SUBTREE    = 0b0000_0010;
    }
}

/// Source of orientation-change signals available on a host.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OrientationSource {
    /// The dedicated screen-orientation API (`change` on the orientation object).
    ScreenOrientation,
    /// The legacy `orientationchange` event on the window.
    WindowEvent,
}

impl OrientationSource {
    /// Target and event kind to register for this source.
    pub fn event<E>(self) -> (EventTarget<E>, EventKind) {
        match self {
            Self::ScreenOrientation => (EventTarget::ScreenOrientation, EventKind::Change),
            Self::WindowEvent => (EventTarget::Window, EventKind::OrientationChange),
        }
    }
}

/// An active observation created by an [`ObserverFactory`].
pub trait Observer<E> {
    /// Start observing `target`.
    fn observe(&mut self, target: &E, options: ObserveOptions) -> Result<(), HostError>;

    /// Stop observing every target. Calling it twice is harmless.
    fn disconnect(&mut self);
}

/// Constructor for size or mutation observers.
///
/// This is also the shape of a size-observer polyfill passed through
/// [`MeasureOptions::polyfill`](crate::options::MeasureOptions::polyfill).
pub trait ObserverFactory<E> {
    /// Create an observer that invokes `callback` whenever it reports a change.
    fn create(&self, callback: Handler) -> Box<dyn Observer<E>>;
}

/// Platform services used by [`Measure`](crate::measure::Measure).
pub trait Host: 'static {
    /// Handle to a document element. Equality means "same element".
    type Element: Clone + PartialEq + Debug + 'static;

    /// Border-box rectangle of `element` in viewport coordinates.
    fn bounding_client_rect(&self, element: &Self::Element) -> Result<Rect, HostError>;

    /// Layout-box (offset) width and height, if `element` has them.
    ///
    /// Returns `None` for elements without layout-box metrics, such as SVG content.
    fn offset_size(&self, element: &Self::Element) -> Option<Size>;

    /// Parent element, or `None` at the top of the tree.
    fn parent_element(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Whether `element` is the document body.
    fn is_body(&self, element: &Self::Element) -> bool;

    /// Computed overflow properties of `element`.
    fn computed_overflow(&self, element: &Self::Element) -> OverflowStyle;

    /// Native size-change observation, if the host has it.
    fn size_observer(&self) -> Option<Rc<dyn ObserverFactory<Self::Element>>>;

    /// Native subtree-mutation observation, if the host has it.
    fn mutation_observer(&self) -> Option<Rc<dyn ObserverFactory<Self::Element>>>;

    /// Preferred orientation-change source, if any.
    fn orientation_source(&self) -> Option<OrientationSource>;

    /// Register `handler` for `kind` events on `target`.
    fn add_event_listener(
        &self,
        target: EventTarget<Self::Element>,
        kind: EventKind,
        options: ListenerOptions,
        handler: Handler,
    ) -> Result<ListenerId, HostError>;

    /// Remove a listener. Unknown or already removed handles are ignored.
    fn remove_event_listener(&self, id: ListenerId);

    /// Run `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a pending timer. Fired or unknown handles are ignored.
    fn clear_timeout(&self, id: TimerId);
}

/// Size-observation capability, resolved once per measurement.
pub enum SizeObservation<E> {
    /// The host's own observer.
    Native(Rc<dyn ObserverFactory<E>>),
    /// A caller-supplied replacement.
    Polyfill(Rc<dyn ObserverFactory<E>>),
    /// Nothing available; measurement runs in degenerate mode.
    Unavailable,
}

impl<E> SizeObservation<E> {
    /// Prefer `polyfill` when given, then the host's native observer.
    pub fn resolve<H>(host: &H, polyfill: Option<Rc<dyn ObserverFactory<E>>>) -> Self
    where
        H: Host<Element = E>,
    {
        match (polyfill, host.size_observer()) {
            (Some(factory), _) => Self::Polyfill(factory),
            (None, Some(factory)) => Self::Native(factory),
            (None, None) => Self::Unavailable,
        }
    }

    /// The factory to use, if any.
    pub fn factory(&self) -> Option<&Rc<dyn ObserverFactory<E>>> {
        match self {
            Self::Native(f) | Self::Polyfill(f) => Some(f),
            Self::Unavailable => None,
        }
    }

    /// Returns true unless [`Unavailable`](Self::Unavailable).
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

impl<E> Clone for SizeObservation<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Native(f) => Self::Native(f.clone()),
            Self::Polyfill(f) => Self::Polyfill(f.clone()),
            Self::Unavailable => Self::Unavailable,
        }
    }
}

impl<E> Debug for SizeObservation<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Native(_) => "Native",
            Self::Polyfill(_) => "Polyfill",
            Self::Unavailable => "Unavailable",
        };
        f.write_str(name)
    }
}
