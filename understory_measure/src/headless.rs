// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic, in-memory [`Host`] for tests, demos, and benchmarks.
//!
//! ## Overview
//!
//! [`Document`] models just enough of a page to drive a
//! [`Measure`](crate::measure::Measure):
//!
//! - an element tree rooted at `<html>` → `<body>`, addressed by generational
//!   [`ElementId`]s;
//! - per-element viewport rectangles, optional layout-box sizes, and overflow styles;
//! - an event listener registry for window, element, and screen-orientation targets;
//! - size and mutation observer registries;
//! - a virtual clock with a timer queue advanced by [`Document::advance`].
//!
//! ## Not a layout engine
//!
//! Rectangles are set by the caller. Scrolling translates the rectangles of
//! the scrolled element's descendants; nothing else is derived.
//!
//! ## Delivery
//!
//! Everything is delivered synchronously from the mutating call:
//! [`Document::set_rect`] notifies size observers when the size changes,
//! [`Document::insert`] / [`Document::remove`] notify mutation observers, and
//! [`Document::scroll_by`] dispatches `scroll` to the window's and ancestors'
//! capturing listeners, then to the scrolled element's own listeners.
//! No internal borrow is held while a callback runs, so callbacks can query
//! and mutate the document.
//!
//! ## Capabilities
//!
//! [`Capabilities`] selects which optional primitives the document reports
//! through [`Host`], so degenerate and fallback paths can be exercised.
//!
//! ```
//! use std::rc::Rc;
//! use kurbo::Rect;
//! use understory_measure::headless::{Document, ElementSpec};
//! use understory_measure::{Measure, MeasureOptions};
//!
//! let doc = Rc::new(Document::new());
//! let el = doc.insert(
//!     doc.body(),
//!     ElementSpec { rect: Rect::new(0.0, 0.0, 100.0, 40.0), ..Default::default() },
//! );
//!
//! let measure = Measure::new(doc.clone(), MeasureOptions::default());
//! let _ = measure.attach(Some(&el));
//! assert_eq!(measure.bounds().width, 100.0);
//!
//! doc.set_rect(el, Rect::new(0.0, 0.0, 160.0, 40.0));
//! assert_eq!(measure.bounds().width, 160.0);
//! ```

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::time::Duration;

use kurbo::{Rect, Size, Vec2};

use crate::error::HostError;
use crate::host::{
    EventKind, EventTarget, Handler, Host, ListenerId, ListenerOptions, ObserveOptions, Observer,
    ObserverFactory, OrientationSource, TimerId,
};
use crate::types::OverflowStyle;

/// Identifier for an element in a [`Document`].
///
/// A slot index plus a generation. Removing an element frees its slot; a
/// reused slot gets a higher generation, so stale ids never alias a new
/// element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32, u32);

impl ElementId {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Optional primitives a [`Document`] exposes through [`Host`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Native size observation.
        const SIZE_OBSERVER      = 0b0000_0001;
        /// Native subtree mutation observation.
        const MUTATION_OBSERVER  = 0b0000_0010;
        /// The dedicated screen-orientation API.
        const SCREEN_ORIENTATION = 0b0000_0100;
        /// The legacy window `orientationchange` event.
        const ORIENTATION_EVENT  = 0b0000_1000;
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// Whether an element has layout-box metrics.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ElementKind {
    /// An HTML element; has offset width and height.
    #[default]
    Html,
    /// SVG content; has no offset metrics.
    Svg,
}

/// Geometry and style of an element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementSpec {
    /// Border-box rectangle in viewport coordinates.
    pub rect: Rect,
    /// Offset width and height when they differ from `rect`'s size
    /// (for example under a scale transform). Defaults to `rect`'s size.
    pub layout_size: Option<Size>,
    /// Computed overflow.
    pub overflow: OverflowStyle,
    /// Element kind.
    pub kind: ElementKind,
}

/// Which registry an observer belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ObserverKind {
    /// Size observation.
    Size,
    /// Subtree mutation observation.
    Mutation,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    spec: ElementSpec,
}

struct ListenerEntry {
    target: EventTarget<ElementId>,
    kind: EventKind,
    options: ListenerOptions,
    handler: Handler,
}

struct ObserverEntry {
    kind: ObserverKind,
    targets: Vec<(ElementId, ObserveOptions)>,
    callback: Handler,
}

#[derive(Default)]
struct DocState {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    listeners: BTreeMap<u64, ListenerEntry>,
    observers: BTreeMap<u64, ObserverEntry>,
    timers: BTreeMap<(Duration, u64), Box<dyn FnOnce()>>,
    next_id: u64,
    now: Duration,
    viewport: Size,
}

impl DocState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn slot(&self, id: ElementId) -> Option<&Slot> {
        let slot = self.slots.get(id.idx())?.as_ref()?;
        (slot.generation == id.1).then_some(slot)
    }

    fn slot_mut(&mut self, id: ElementId) -> Option<&mut Slot> {
        let slot = self.slots.get_mut(id.idx())?.as_mut()?;
        (slot.generation == id.1).then_some(slot)
    }

    fn is_alive(&self, id: ElementId) -> bool {
        self.slot(id).is_some()
    }

    fn insert(&mut self, parent: Option<ElementId>, spec: ElementSpec) -> ElementId {
        let slot = |generation| Slot {
            generation,
            parent,
            children: Vec::new(),
            spec,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(slot(generation));
            (idx, generation)
        } else {
            self.slots.push(Some(slot(1)));
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ElementId uses 32-bit indices by design."
        )]
        let id = ElementId::new(idx as u32, generation);
        if let Some(p) = parent.and_then(|p| self.slot_mut(p)) {
            p.children.push(id);
        }
        id
    }

    fn remove_subtree(&mut self, id: ElementId) {
        let Some(slot) = self.slots[id.idx()].take() else {
            return;
        };
        self.free_list.push(id.idx());
        for child in slot.children {
            self.remove_subtree(child);
        }
    }

    /// Root→`id` chain, excluding `id`.
    fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut next = self.slot(id).and_then(|s| s.parent);
        while let Some(p) = next {
            out.push(p);
            next = self.slot(p).and_then(|s| s.parent);
        }
        out.reverse();
        out
    }

    fn translate_descendants(&mut self, id: ElementId, delta: Vec2) {
        let children = match self.slot(id) {
            Some(s) => s.children.clone(),
            None => return,
        };
        for child in children {
            if let Some(s) = self.slot_mut(child) {
                s.spec.rect = s.spec.rect + delta;
            }
            self.translate_descendants(child, delta);
        }
    }

    fn listeners_matching<'a>(
        &'a self,
        pred: impl Fn(&ListenerEntry) -> bool + 'a,
    ) -> impl Iterator<Item = Handler> + 'a {
        self.listeners
            .values()
            .filter(move |l| pred(*l))
            .map(|l| l.handler.clone())
    }
}

/// In-memory document implementing [`Host`].
///
/// See the [module docs](self).
pub struct Document {
    shared: Rc<RefCell<DocState>>,
    capabilities: Capabilities,
    root: ElementId,
    body: ElementId,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.shared.borrow();
        let alive = state.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Document")
            .field("capabilities", &self.capabilities)
            .field("elements_alive", &alive)
            .field("listeners", &state.listeners.len())
            .field("observers", &state.observers.len())
            .field("pending_timers", &state.timers.len())
            .field("now", &state.now)
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Viewport size of a fresh document.
    pub const DEFAULT_VIEWPORT: Size = Size::new(1280.0, 800.0);

    /// A document with every capability.
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::all())
    }

    /// A document exposing only `capabilities`.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        let viewport = Rect::from_origin_size((0.0, 0.0), Self::DEFAULT_VIEWPORT);
        let mut state = DocState {
            viewport: Self::DEFAULT_VIEWPORT,
            ..Default::default()
        };
        let page = ElementSpec {
            rect: viewport,
            ..Default::default()
        };
        let root = state.insert(None, page.clone());
        let body = state.insert(Some(root), page);
        Self {
            shared: Rc::new(RefCell::new(state)),
            capabilities,
            root,
            body,
        }
    }

    /// The `<html>` element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// The `<body>` element.
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Enabled capabilities.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Returns true if `id` refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.shared.borrow().is_alive(id)
    }

    /// Insert a child of `parent` and notify mutation observers.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn insert(&self, parent: ElementId, spec: ElementSpec) -> ElementId {
        let id = {
            let mut state = self.shared.borrow_mut();
            assert!(state.is_alive(parent), "insert under a stale ElementId");
            state.insert(Some(parent), spec)
        };
        self.notify_mutation(parent);
        id
    }

    /// Remove an element and its subtree and notify mutation observers.
    ///
    /// The root and body cannot be removed; stale ids are ignored.
    pub fn remove(&self, id: ElementId) {
        if id == self.root || id == self.body {
            return;
        }
        let parent = {
            let mut state = self.shared.borrow_mut();
            let Some(parent) = state.slot(id).map(|s| s.parent) else {
                return;
            };
            if let Some(p) = parent.and_then(|p| state.slot_mut(p)) {
                p.children.retain(|c| *c != id);
            }
            state.remove_subtree(id);
            parent
        };
        if let Some(parent) = parent {
            self.notify_mutation(parent);
        }
    }

    /// Current rectangle of `id`.
    pub fn rect(&self, id: ElementId) -> Option<Rect> {
        self.shared.borrow().slot(id).map(|s| s.spec.rect)
    }

    /// Set the rectangle of `id`; size observers fire when the size changed.
    pub fn set_rect(&self, id: ElementId, rect: Rect) {
        let resized = {
            let mut state = self.shared.borrow_mut();
            let Some(slot) = state.slot_mut(id) else {
                return;
            };
            let old = slot.spec.rect;
            slot.spec.rect = rect;
            slot.spec.layout_size.is_none() && old.size() != rect.size()
        };
        if resized {
            self.notify_resize(id);
        }
    }

    /// Set the layout-box size of `id`; size observers fire when it changed.
    pub fn set_offset_size(&self, id: ElementId, size: Option<Size>) {
        let resized = {
            let mut state = self.shared.borrow_mut();
            let Some(slot) = state.slot_mut(id) else {
                return;
            };
            let before = slot.spec.layout_size.unwrap_or(slot.spec.rect.size());
            slot.spec.layout_size = size;
            before != size.unwrap_or(slot.spec.rect.size())
        };
        if resized {
            self.notify_resize(id);
        }
    }

    /// Set the computed overflow of `id`.
    pub fn set_overflow(&self, id: ElementId, overflow: OverflowStyle) {
        if let Some(slot) = self.shared.borrow_mut().slot_mut(id) {
            slot.spec.overflow = overflow;
        }
    }

    /// Scroll `id` by `delta`: descendants move by `-delta`, then `scroll` is dispatched.
    pub fn scroll_by(&self, id: ElementId, delta: Vec2) {
        let handlers: Vec<Handler> = {
            let mut state = self.shared.borrow_mut();
            if !state.is_alive(id) {
                return;
            }
            state.translate_descendants(id, -delta);
            let ancestors = state.ancestors(id);
            let capturing = |l: &ListenerEntry| {
                l.kind == EventKind::Scroll && l.options.contains(ListenerOptions::CAPTURE)
            };
            let mut out: Vec<Handler> = state
                .listeners_matching(|l| capturing(l) && l.target == EventTarget::Window)
                .collect();
            for a in ancestors {
                out.extend(state.listeners_matching(|l| {
                    capturing(l) && l.target == EventTarget::Element(a)
                }));
            }
            out.extend(state.listeners_matching(|l| {
                l.kind == EventKind::Scroll && l.target == EventTarget::Element(id)
            }));
            out
        };
        run(handlers);
    }

    /// Scroll the window by `delta`: every element moves by `-delta`, then `scroll` is dispatched.
    pub fn scroll_window(&self, delta: Vec2) {
        {
            let mut state = self.shared.borrow_mut();
            let body = self.body;
            state.translate_descendants(body, -delta);
        }
        self.dispatch(EventTarget::Window, EventKind::Scroll);
    }

    /// Resize the viewport and dispatch `resize` on the window.
    pub fn resize_window(&self, size: Size) {
        {
            let mut state = self.shared.borrow_mut();
            state.viewport = size;
            let page = Rect::from_origin_size((0.0, 0.0), size);
            for id in [self.root, self.body] {
                if let Some(slot) = state.slot_mut(id) {
                    slot.spec.rect = page;
                }
            }
        }
        self.dispatch(EventTarget::Window, EventKind::Resize);
    }

    /// Current viewport size.
    pub fn viewport(&self) -> Size {
        self.shared.borrow().viewport
    }

    /// Rotate the screen, notifying whichever orientation sources are enabled.
    pub fn rotate(&self) {
        let vp = self.viewport();
        self.shared.borrow_mut().viewport = Size::new(vp.height, vp.width);
        if self
            .capabilities
            .contains(Capabilities::SCREEN_ORIENTATION)
        {
            self.dispatch(EventTarget::ScreenOrientation, EventKind::Change);
        }
        if self.capabilities.contains(Capabilities::ORIENTATION_EVENT) {
            self.dispatch(EventTarget::Window, EventKind::OrientationChange);
        }
    }

    /// Move the virtual clock forward, running due timers in order.
    ///
    /// Timers armed by a callback run in the same call if they fall due
    /// before the new time.
    pub fn advance(&self, by: Duration) {
        let until = self.shared.borrow().now + by;
        loop {
            let next = {
                let mut state = self.shared.borrow_mut();
                match state.timers.first_key_value() {
                    Some((&(due, _), _)) if due <= until => {
                        state.now = due;
                        state.timers.pop_first().map(|(_, f)| f)
                    }
                    _ => None,
                }
            };
            match next {
                Some(f) => f(),
                None => break,
            }
        }
        self.shared.borrow_mut().now = until;
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.shared.borrow().now
    }

    /// Number of timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.shared.borrow().timers.len()
    }

    /// Number of registered event listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.borrow().listeners.len()
    }

    /// Number of listeners registered on `target`.
    pub fn listeners_on(&self, target: &EventTarget<ElementId>) -> usize {
        self.shared
            .borrow()
            .listeners
            .values()
            .filter(|l| l.target == *target)
            .count()
    }

    /// Targets currently observed by observers of `kind`, in registration order.
    pub fn observed(&self, kind: ObserverKind) -> Vec<ElementId> {
        self.shared
            .borrow()
            .observers
            .values()
            .filter(|o| o.kind == kind)
            .flat_map(|o| o.targets.iter().map(|(id, _)| *id))
            .collect()
    }

    /// A size-observer factory for this document, regardless of [`Capabilities`].
    ///
    /// Pass it as a polyfill to exercise the replacement path.
    pub fn size_observer_factory(&self) -> Rc<dyn ObserverFactory<ElementId>> {
        self.factory(ObserverKind::Size)
    }

    fn factory(&self, kind: ObserverKind) -> Rc<dyn ObserverFactory<ElementId>> {
        Rc::new(HeadlessObserverFactory {
            shared: Rc::downgrade(&self.shared),
            kind,
        })
    }

    fn dispatch(&self, target: EventTarget<ElementId>, kind: EventKind) {
        let handlers: Vec<Handler> = self
            .shared
            .borrow()
            .listeners_matching(|l| l.target == target && l.kind == kind)
            .collect();
        run(handlers);
    }

    fn notify_resize(&self, id: ElementId) {
        let callbacks: Vec<Handler> = self
            .shared
            .borrow()
            .observers
            .values()
            .filter(|o| o.kind == ObserverKind::Size && o.targets.iter().any(|(t, _)| *t == id))
            .map(|o| o.callback.clone())
            .collect();
        run(callbacks);
    }

    /// Mutation observers watching `parent`'s child list, directly or through a subtree watch.
    fn notify_mutation(&self, parent: ElementId) {
        let callbacks: Vec<Handler> = {
            let state = self.shared.borrow();
            let ancestors = state.ancestors(parent);
            state
                .observers
                .values()
                .filter(|o| o.kind == ObserverKind::Mutation)
                .filter(|o| {
                    o.targets.iter().any(|(t, opts)| {
                        opts.contains(ObserveOptions::CHILD_LIST)
                            && (*t == parent
                                || (opts.contains(ObserveOptions::SUBTREE)
                                    && ancestors.contains(t)))
                    })
                })
                .map(|o| o.callback.clone())
                .collect()
        };
        run(callbacks);
    }
}

fn run(handlers: Vec<Handler>) {
    for h in handlers {
        h();
    }
}

impl Host for Document {
    type Element = ElementId;

    fn bounding_client_rect(&self, element: &ElementId) -> Result<Rect, HostError> {
        self.rect(*element).ok_or(HostError::Detached)
    }

    fn offset_size(&self, element: &ElementId) -> Option<Size> {
        let state = self.shared.borrow();
        let spec = &state.slot(*element)?.spec;
        match spec.kind {
            ElementKind::Html => Some(spec.layout_size.unwrap_or(spec.rect.size())),
            ElementKind::Svg => None,
        }
    }

    fn parent_element(&self, element: &ElementId) -> Option<ElementId> {
        self.shared.borrow().slot(*element)?.parent
    }

    fn is_body(&self, element: &ElementId) -> bool {
        *element == self.body
    }

    fn computed_overflow(&self, element: &ElementId) -> OverflowStyle {
        self.shared
            .borrow()
            .slot(*element)
            .map(|s| s.spec.overflow)
            .unwrap_or_default()
    }

    fn size_observer(&self) -> Option<Rc<dyn ObserverFactory<ElementId>>> {
        self.capabilities
            .contains(Capabilities::SIZE_OBSERVER)
            .then(|| self.factory(ObserverKind::Size))
    }

    fn mutation_observer(&self) -> Option<Rc<dyn ObserverFactory<ElementId>>> {
        self.capabilities
            .contains(Capabilities::MUTATION_OBSERVER)
            .then(|| self.factory(ObserverKind::Mutation))
    }

    fn orientation_source(&self) -> Option<OrientationSource> {
        if self.capabilities.contains(Capabilities::SCREEN_ORIENTATION) {
            Some(OrientationSource::ScreenOrientation)
        } else if self.capabilities.contains(Capabilities::ORIENTATION_EVENT) {
            Some(OrientationSource::WindowEvent)
        } else {
            None
        }
    }

    fn add_event_listener(
        &self,
        target: EventTarget<ElementId>,
        kind: EventKind,
        options: ListenerOptions,
        handler: Handler,
    ) -> Result<ListenerId, HostError> {
        let supported = match (&target, kind) {
            (EventTarget::Element(id), EventKind::Scroll) => {
                if !self.is_alive(*id) {
                    return Err(HostError::Detached);
                }
                true
            }
            (EventTarget::Window, EventKind::Scroll | EventKind::Resize) => true,
            (EventTarget::Window, EventKind::OrientationChange) => self
                .capabilities
                .contains(Capabilities::ORIENTATION_EVENT),
            (EventTarget::ScreenOrientation, EventKind::Change) => self
                .capabilities
                .contains(Capabilities::SCREEN_ORIENTATION),
            _ => false,
        };
        if !supported {
            return Err(HostError::UnsupportedEvent(kind));
        }
        let mut state = self.shared.borrow_mut();
        let id = state.next_id();
        state.listeners.insert(
            id,
            ListenerEntry {
                target,
                kind,
                options,
                handler,
            },
        );
        Ok(ListenerId::new(id))
    }

    fn remove_event_listener(&self, id: ListenerId) {
        self.shared.borrow_mut().listeners.remove(&id.raw());
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut state = self.shared.borrow_mut();
        let id = state.next_id();
        let due = state.now + delay;
        state.timers.insert((due, id), callback);
        TimerId::new(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        self.shared
            .borrow_mut()
            .timers
            .retain(|&(_, seq), _| seq != id.raw());
    }
}

struct HeadlessObserverFactory {
    shared: Weak<RefCell<DocState>>,
    kind: ObserverKind,
}

impl ObserverFactory<ElementId> for HeadlessObserverFactory {
    fn create(&self, callback: Handler) -> Box<dyn Observer<ElementId>> {
        let id = self.shared.upgrade().map(|shared| {
            let mut state = shared.borrow_mut();
            let id = state.next_id();
            state.observers.insert(
                id,
                ObserverEntry {
                    kind: self.kind,
                    targets: Vec::new(),
                    callback,
                },
            );
            id
        });
        Box::new(HeadlessObserver {
            shared: self.shared.clone(),
            id,
        })
    }
}

struct HeadlessObserver {
    shared: Weak<RefCell<DocState>>,
    id: Option<u64>,
}

impl Observer<ElementId> for HeadlessObserver {
    fn observe(&mut self, target: &ElementId, options: ObserveOptions) -> Result<(), HostError> {
        let shared = self.shared.upgrade().ok_or(HostError::Detached)?;
        let mut state = shared.borrow_mut();
        if !state.is_alive(*target) {
            return Err(HostError::Detached);
        }
        let entry = self
            .id
            .and_then(|id| state.observers.get_mut(&id))
            .ok_or(HostError::Detached)?;
        entry.targets.push((*target, options));
        Ok(())
    }

    fn disconnect(&mut self) {
        let (Some(id), Some(shared)) = (self.id.take(), self.shared.upgrade()) else {
            return;
        };
        shared.borrow_mut().observers.remove(&id);
    }
}

impl Drop for HeadlessObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
