// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds snapshots and change gating.

use crate::error::HostError;
use crate::host::Host;
use crate::types::Bounds;

/// Query the current geometry of `element` and normalize it into a [`Bounds`].
///
/// The record starts from the bounding client rect. With `offset_size` set and
/// an element that has layout-box metrics, `width` and `height` are replaced by
/// the offset width and height; the edges and origin keep the bounding rect.
pub fn snapshot<H: Host>(
    host: &H,
    element: &H::Element,
    offset_size: bool,
) -> Result<Bounds, HostError> {
    let bounds = Bounds::from_rect(host.bounding_client_rect(element)?);
    if offset_size {
        if let Some(size) = host.offset_size(element) {
            return Ok(bounds.with_size(size));
        }
    }
    Ok(bounds)
}

/// Returns `next` if it differs from `last` in any field.
pub fn changed(last: &Bounds, next: Bounds) -> Option<Bounds> {
    (*last != next).then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Document, ElementKind, ElementSpec};
    use kurbo::{Rect, Size};

    #[test]
    fn offset_size_replaces_width_and_height() {
        let doc = Document::new();
        // 100 wide on screen; a 2px border on each side gives a 104 layout box.
        let el = doc.insert(
            doc.body(),
            ElementSpec {
                rect: Rect::new(10.0, 10.0, 110.0, 60.0),
                layout_size: Some(Size::new(104.0, 54.0)),
                ..Default::default()
            },
        );

        let plain = snapshot(&doc, &el, false).unwrap();
        assert_eq!(plain.width, 100.0);
        assert_eq!(plain.height, 50.0);

        let offset = snapshot(&doc, &el, true).unwrap();
        assert_eq!(offset.width, 104.0);
        assert_eq!(offset.height, 54.0);
        assert_eq!(offset.left, 10.0);
        assert_eq!(offset.right, 110.0, "edges stay on the bounding rect");
    }

    #[test]
    fn offset_size_ignored_without_layout_box() {
        let doc = Document::new();
        let el = doc.insert(
            doc.body(),
            ElementSpec {
                rect: Rect::new(0.0, 0.0, 100.0, 100.0),
                layout_size: Some(Size::new(104.0, 104.0)),
                kind: ElementKind::Svg,
                ..Default::default()
            },
        );
        let b = snapshot(&doc, &el, true).unwrap();
        assert_eq!(b.width, 100.0);
    }

    #[test]
    fn removed_element_reports_detached() {
        let doc = Document::new();
        let el = doc.insert(doc.body(), ElementSpec::default());
        doc.remove(el);
        assert_eq!(snapshot(&doc, &el, false), Err(HostError::Detached));
    }

    #[test]
    fn identical_records_are_not_changes() {
        let a = Bounds::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(changed(&a, a), None);
        let mut b = a;
        b.bottom = 11.0;
        assert_eq!(changed(&a, b), Some(b));
    }
}
