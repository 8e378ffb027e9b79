// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Discovery of the scroll containers that can move an element.
//!
//! Scrolling an ancestor shifts a descendant on screen without changing its
//! size, so size observation alone misses it. The ancestors found here are the
//! ones that get scroll listeners.

use alloc::vec::Vec;

use crate::host::Host;

/// Ancestors of `element` whose computed overflow permits scrolling.
///
/// The result is ordered nearest first. The walk starts at the parent, stops
/// at the document body (which is never included), and also stops when the
/// chain runs out. Styles are read at call time and nothing is cached.
pub fn find_scroll_ancestors<H: Host>(host: &H, element: &H::Element) -> Vec<H::Element> {
    let mut out = Vec::new();
    if host.is_body(element) {
        return out;
    }
    let mut next = host.parent_element(element);
    while let Some(ancestor) = next {
        if host.is_body(&ancestor) {
            break;
        }
        if host.computed_overflow(&ancestor).is_scroll_container() {
            out.push(ancestor.clone());
        }
        next = host.parent_element(&ancestor);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Document, ElementSpec};
    use crate::types::{Overflow, OverflowStyle};
    use alloc::vec;

    fn scroller() -> ElementSpec {
        ElementSpec {
            overflow: OverflowStyle::uniform(Overflow::Scroll),
            ..Default::default()
        }
    }

    #[test]
    fn finds_only_the_scrolling_grandparent() {
        let doc = Document::new();
        let grandparent = doc.insert(doc.body(), scroller());
        let parent = doc.insert(grandparent, ElementSpec::default());
        let target = doc.insert(parent, ElementSpec::default());

        assert_eq!(find_scroll_ancestors(&doc, &target), vec![grandparent]);
    }

    #[test]
    fn nearest_first_and_stops_at_body() {
        let doc = Document::new();
        doc.set_overflow(doc.body(), OverflowStyle::uniform(Overflow::Auto));
        let outer = doc.insert(doc.body(), scroller());
        let inner = doc.insert(
            outer,
            ElementSpec {
                overflow: OverflowStyle {
                    overflow_y: Overflow::Auto,
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        let target = doc.insert(inner, ElementSpec::default());

        assert_eq!(find_scroll_ancestors(&doc, &target), vec![inner, outer]);
    }

    #[test]
    fn target_itself_is_not_included() {
        let doc = Document::new();
        let target = doc.insert(doc.body(), scroller());
        assert!(find_scroll_ancestors(&doc, &target).is_empty());
    }

    #[test]
    fn hidden_overflow_is_not_a_scroll_container() {
        let doc = Document::new();
        let clipper = doc.insert(
            doc.body(),
            ElementSpec {
                overflow: OverflowStyle::uniform(Overflow::Hidden),
                ..Default::default()
            },
        );
        let target = doc.insert(clipper, ElementSpec::default());
        assert!(find_scroll_ancestors(&doc, &target).is_empty());
    }

    #[test]
    fn body_and_detached_elements_yield_nothing() {
        let doc = Document::new();
        assert!(find_scroll_ancestors(&doc, &doc.body()).is_empty());

        let s = doc.insert(doc.body(), scroller());
        let t = doc.insert(s, ElementSpec::default());
        doc.remove(t);
        assert!(find_scroll_ancestors(&doc, &t).is_empty());
    }
}
