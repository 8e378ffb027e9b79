// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-attachment observation state and its attach/detach lifecycle.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use log::{debug, warn};

use crate::host::{
    EventKind, EventTarget, Handler, Host, ListenerId, ListenerOptions, ObserveOptions, Observer,
    ObserverFactory,
};

/// The two rate-limited handlers of a measurement.
///
/// Built once per measurement so every registration uses the same handlers.
#[derive(Clone)]
pub(crate) struct Handlers {
    pub(crate) resize: Handler,
    pub(crate) scroll: Handler,
}

impl core::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handlers").finish_non_exhaustive()
    }
}

/// Mutable state owned by one measurement.
pub(crate) struct ObservationState<E> {
    pub(crate) target: Option<E>,
    pub(crate) scroll_ancestors: Vec<E>,
    scroll_listeners: Vec<ListenerId>,
    size_observer: Option<Box<dyn Observer<E>>>,
    orientation: Option<ListenerId>,
    child_watch: Option<Box<dyn Observer<E>>>,
    /// Bumped on every new target; ties an attach cleanup to its element.
    pub(crate) epoch: u64,
}

impl<E: core::fmt::Debug> core::fmt::Debug for ObservationState<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObservationState")
            .field("target", &self.target)
            .field("scroll_ancestors", &self.scroll_ancestors)
            .field("scroll_listeners", &self.scroll_listeners.len())
            .field("size_observer", &self.size_observer.is_some())
            .field("orientation", &self.orientation)
            .field("child_watch", &self.child_watch.is_some())
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl<E> Default for ObservationState<E> {
    fn default() -> Self {
        Self {
            target: None,
            scroll_ancestors: Vec::new(),
            scroll_listeners: Vec::new(),
            size_observer: None,
            orientation: None,
            child_watch: None,
            epoch: 0,
        }
    }
}

impl<E: Clone + core::fmt::Debug + 'static> ObservationState<E> {
    /// Wire observers and listeners to the current target.
    ///
    /// Expects a prior [`detach`](Self::detach). Does nothing without a target.
    pub(crate) fn attach<H>(
        &mut self,
        host: &H,
        sizes: &Rc<dyn ObserverFactory<E>>,
        handlers: &Handlers,
        scroll: bool,
    ) where
        H: Host<Element = E>,
    {
        let Some(target) = self.target.clone() else {
            return;
        };

        let mut observer = sizes.create(handlers.resize.clone());
        match observer.observe(&target, ObserveOptions::empty()) {
            Ok(()) => self.size_observer = Some(observer),
            Err(err) => {
                observer.disconnect();
                warn!("size observation of {target:?} failed: {err}");
            }
        }

        if scroll {
            for ancestor in &self.scroll_ancestors {
                match host.add_event_listener(
                    EventTarget::Element(ancestor.clone()),
                    EventKind::Scroll,
                    ListenerOptions::CAPTURE | ListenerOptions::PASSIVE,
                    handlers.scroll.clone(),
                ) {
                    Ok(id) => self.scroll_listeners.push(id),
                    Err(err) => warn!("scroll listener on {ancestor:?} failed: {err}"),
                }
            }
        }

        if let Some(source) = host.orientation_source() {
            let (on, kind) = source.event();
            match host.add_event_listener(
                on,
                kind,
                ListenerOptions::empty(),
                handlers.scroll.clone(),
            ) {
                Ok(id) => self.orientation = Some(id),
                Err(err) => warn!("orientation listener ({source:?}) failed: {err}"),
            }
        } else {
            debug!("no orientation source; orientation changes are not tracked");
        }

        debug!(
            "attached to {target:?}: {} scroll listener(s), size observer {}",
            self.scroll_listeners.len(),
            if self.size_observer.is_some() {
                "active"
            } else {
                "missing"
            }
        );
    }

    /// Tear down everything [`attach`](Self::attach) installed. Safe with nothing attached.
    pub(crate) fn detach<H>(&mut self, host: &H)
    where
        H: Host<Element = E>,
    {
        for id in self.scroll_listeners.drain(..) {
            host.remove_event_listener(id);
        }
        if let Some(mut observer) = self.size_observer.take() {
            observer.disconnect();
        }
        if let Some(id) = self.orientation.take() {
            host.remove_event_listener(id);
        }
    }

    /// Watch the target's subtree for child insertions and removals.
    ///
    /// Returns false when the host has no mutation observer or observing fails.
    pub(crate) fn watch_children<H>(&mut self, host: &H, handler: Handler) -> bool
    where
        H: Host<Element = E>,
    {
        self.unwatch_children();
        let Some(target) = self.target.clone() else {
            return false;
        };
        let Some(factory) = host.mutation_observer() else {
            debug!("no mutation observer; child changes of {target:?} are not tracked");
            return false;
        };
        let mut observer = factory.create(handler);
        match observer.observe(&target, ObserveOptions::CHILD_LIST | ObserveOptions::SUBTREE) {
            Ok(()) => {
                self.child_watch = Some(observer);
                true
            }
            Err(err) => {
                observer.disconnect();
                warn!("child watch on {target:?} failed: {err}");
                false
            }
        }
    }

    /// Disconnect the child watch, if any.
    pub(crate) fn unwatch_children(&mut self) {
        if let Some(mut observer) = self.child_watch.take() {
            observer.disconnect();
        }
    }

    pub(crate) fn is_watching_children(&self) -> bool {
        self.child_watch.is_some()
    }

    #[cfg(test)]
    pub(crate) fn registration_count(&self) -> usize {
        self.scroll_listeners.len()
            + usize::from(self.size_observer.is_some())
            + usize::from(self.orientation.is_some())
            + usize::from(self.child_watch.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::headless::{Capabilities, Document, ElementId, ElementSpec, ObserverKind};
    use crate::types::{Overflow, OverflowStyle};
    use alloc::vec;
    use core::cell::Cell;

    /// Observers that refuse every target and count disconnects.
    struct Refusing {
        disconnects: Rc<Cell<u32>>,
    }

    impl Observer<ElementId> for Refusing {
        fn observe(&mut self, _: &ElementId, _: ObserveOptions) -> Result<(), HostError> {
            Err(HostError::Detached)
        }

        fn disconnect(&mut self) {
            self.disconnects.set(self.disconnects.get() + 1);
        }
    }

    impl ObserverFactory<ElementId> for Refusing {
        fn create(&self, _: Handler) -> Box<dyn Observer<ElementId>> {
            Box::new(Self {
                disconnects: self.disconnects.clone(),
            })
        }
    }

    fn handlers() -> Handlers {
        Handlers {
            resize: Rc::new(|| {}),
            scroll: Rc::new(|| {}),
        }
    }

    fn scroller() -> ElementSpec {
        ElementSpec {
            overflow: OverflowStyle::uniform(Overflow::Auto),
            ..Default::default()
        }
    }

    #[test]
    fn attach_then_detach_is_symmetric() {
        let doc = Document::new();
        let s = doc.insert(doc.body(), scroller());
        let t = doc.insert(s, ElementSpec::default());
        let sizes = doc.size_observer_factory();

        let mut st = ObservationState {
            target: Some(t),
            scroll_ancestors: vec![s],
            ..Default::default()
        };
        st.attach(&doc, &sizes, &handlers(), true);
        assert_eq!(st.registration_count(), 3);
        assert_eq!(doc.listeners_on(&EventTarget::Element(s)), 1);
        assert_eq!(doc.listeners_on(&EventTarget::ScreenOrientation), 1);
        assert_eq!(doc.observed(ObserverKind::Size), vec![t]);

        st.detach(&doc);
        assert_eq!(st.registration_count(), 0);
        assert_eq!(doc.listener_count(), 0);
        assert!(doc.observed(ObserverKind::Size).is_empty());
    }

    #[test]
    fn scroll_disabled_skips_ancestors() {
        let doc = Document::new();
        let s = doc.insert(doc.body(), scroller());
        let t = doc.insert(s, ElementSpec::default());
        let mut st = ObservationState {
            target: Some(t),
            scroll_ancestors: vec![s],
            ..Default::default()
        };
        st.attach(&doc, &doc.size_observer_factory(), &handlers(), false);
        assert_eq!(doc.listeners_on(&EventTarget::Element(s)), 0);
    }

    #[test]
    fn detach_with_nothing_attached_is_a_no_op() {
        let doc = Document::new();
        let mut st: ObservationState<_> = ObservationState::default();
        st.detach(&doc);
        st.detach(&doc);
        st.unwatch_children();
        assert_eq!(st.registration_count(), 0);
    }

    #[test]
    fn orientation_falls_back_to_window_event() {
        let doc = Document::with_capabilities(
            Capabilities::SIZE_OBSERVER | Capabilities::ORIENTATION_EVENT,
        );
        let t = doc.insert(doc.body(), ElementSpec::default());
        let mut st = ObservationState {
            target: Some(t),
            ..Default::default()
        };
        st.attach(&doc, &doc.size_observer_factory(), &handlers(), false);
        assert_eq!(doc.listeners_on(&EventTarget::ScreenOrientation), 0);
        assert_eq!(doc.listeners_on(&EventTarget::Window), 1);

        st.detach(&doc);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn no_orientation_source_is_not_an_error() {
        let doc = Document::with_capabilities(Capabilities::SIZE_OBSERVER);
        let t = doc.insert(doc.body(), ElementSpec::default());
        let mut st = ObservationState {
            target: Some(t),
            ..Default::default()
        };
        st.attach(&doc, &doc.size_observer_factory(), &handlers(), true);
        assert_eq!(st.registration_count(), 1, "size observer only");
    }

    #[test]
    fn child_watch_needs_a_mutation_observer() {
        let doc = Document::with_capabilities(Capabilities::SIZE_OBSERVER);
        let t = doc.insert(doc.body(), ElementSpec::default());
        let mut st = ObservationState {
            target: Some(t),
            ..Default::default()
        };
        assert!(!st.watch_children(&doc, Rc::new(|| {})));

        let doc = Document::new();
        let t = doc.insert(doc.body(), ElementSpec::default());
        st.target = Some(t);
        assert!(st.watch_children(&doc, Rc::new(|| {})));
        assert_eq!(doc.observed(ObserverKind::Mutation), vec![t]);
        st.unwatch_children();
        assert!(doc.observed(ObserverKind::Mutation).is_empty());
    }

    #[test]
    fn removed_target_skips_failed_registrations() {
        let doc = Document::new();
        let s = doc.insert(doc.body(), scroller());
        let t = doc.insert(s, ElementSpec::default());
        doc.remove(s);
        let mut st = ObservationState {
            target: Some(t),
            scroll_ancestors: vec![s],
            ..Default::default()
        };
        st.attach(&doc, &doc.size_observer_factory(), &handlers(), true);
        // Only the orientation listener succeeds.
        assert_eq!(st.registration_count(), 1);
        st.detach(&doc);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn refused_size_observation_is_disconnected() {
        let doc = Document::new();
        let t = doc.insert(doc.body(), ElementSpec::default());
        let disconnects = Rc::new(Cell::new(0));
        let sizes: Rc<dyn ObserverFactory<ElementId>> = Rc::new(Refusing {
            disconnects: disconnects.clone(),
        });
        let mut st = ObservationState {
            target: Some(t),
            ..Default::default()
        };
        st.attach(&doc, &sizes, &handlers(), false);
        assert_eq!(disconnects.get(), 1);
        assert_eq!(st.registration_count(), 1, "orientation listener only");
    }
}
