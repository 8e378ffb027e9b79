// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core value types: the published bounds record, overflow styles, and trigger paths.

use kurbo::{Rect, Size};

/// Geometric snapshot of an element in viewport coordinates.
///
/// A `Bounds` is a plain `Copy` value. Once published by a
/// [`Measure`](crate::measure::Measure) it is never changed in place; every
/// accepted change produces a fresh record.
///
/// Equality is exact on all eight fields with no epsilon tolerance, so a
/// sub-pixel move counts as a change.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Horizontal origin of the bounding box.
    pub x: f64,
    /// Vertical origin of the bounding box.
    pub y: f64,
    /// Width of the bounding box (or the layout-box width in offset-size mode).
    pub width: f64,
    /// Height of the bounding box (or the layout-box height in offset-size mode).
    pub height: f64,
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
    /// Left edge.
    pub left: f64,
}

impl Bounds {
    /// All fields zero. The initial value of a live measurement.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    /// Fixed value reported in degenerate mode, when no size observation is available.
    ///
    /// Describes a 1280×800 box at the origin.
    pub const HEADLESS: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1280.0,
        height: 800.0,
        top: 0.0,
        right: 1280.0,
        bottom: 800.0,
        left: 0.0,
    };

    /// Build a record from a viewport-space rectangle.
    ///
    /// `x`/`y`, `width`/`height` follow the rectangle's origin and signed
    /// extents; the edge fields are normalized so `left <= right` and
    /// `top <= bottom`.
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
            top: rect.y0.min(rect.y1),
            right: rect.x0.max(rect.x1),
            bottom: rect.y0.max(rect.y1),
            left: rect.x0.min(rect.x1),
        }
    }

    /// Return a copy with `width`/`height` replaced and every other field kept.
    #[must_use]
    pub fn with_size(self, size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            ..self
        }
    }

    /// The edge rectangle (`left`, `top`, `right`, `bottom`).
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom)
    }

    /// The reported size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Which notification path produced an update.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Trigger {
    /// Size observation, window resize, and subtree mutation.
    Resize,
    /// Ancestor scroll, window scroll, and orientation change.
    Scroll,
}

/// A computed CSS overflow value.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Overflow {
    /// `visible`
    #[default]
    Visible,
    /// `hidden`
    Hidden,
    /// `clip`
    Clip,
    /// `scroll`
    Scroll,
    /// `auto`
    Auto,
}

impl Overflow {
    /// Returns true for `auto` and `scroll`.
    pub const fn permits_scrolling(self) -> bool {
        matches!(self, Self::Auto | Self::Scroll)
    }
}

/// The three computed overflow properties of an element.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct OverflowStyle {
    /// `overflow`
    pub overflow: Overflow,
    /// `overflow-x`
    pub overflow_x: Overflow,
    /// `overflow-y`
    pub overflow_y: Overflow,
}

impl OverflowStyle {
    /// Same value on all three properties.
    pub const fn uniform(value: Overflow) -> Self {
        Self {
            overflow: value,
            overflow_x: value,
            overflow_y: value,
        }
    }

    /// Whether any of the three properties makes the element a scroll container.
    pub const fn is_scroll_container(&self) -> bool {
        self.overflow.permits_scrolling()
            || self.overflow_x.permits_scrolling()
            || self.overflow_y.permits_scrolling()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rect_fills_edges() {
        let b = Bounds::from_rect(Rect::new(10.0, 20.0, 110.0, 70.0));
        assert_eq!(b.x, 10.0);
        assert_eq!(b.y, 20.0);
        assert_eq!(b.width, 100.0);
        assert_eq!(b.height, 50.0);
        assert_eq!(b.left, 10.0);
        assert_eq!(b.top, 20.0);
        assert_eq!(b.right, 110.0);
        assert_eq!(b.bottom, 70.0);
        assert_eq!(b.rect(), Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn from_rect_normalizes_flipped_edges() {
        let b = Bounds::from_rect(Rect::new(50.0, 40.0, 10.0, 0.0));
        assert_eq!(b.width, -40.0);
        assert_eq!(b.left, 10.0);
        assert_eq!(b.right, 50.0);
        assert_eq!(b.top, 0.0);
        assert_eq!(b.bottom, 40.0);
    }

    #[test]
    fn with_size_only_touches_size() {
        let b = Bounds::from_rect(Rect::new(0.0, 0.0, 100.0, 20.0));
        let o = b.with_size(Size::new(104.0, 24.0));
        assert_eq!(o.width, 104.0);
        assert_eq!(o.height, 24.0);
        assert_eq!(o.right, 100.0, "edges keep the bounding rect");
        assert_eq!(o.bottom, 20.0);
    }

    #[test]
    fn equality_is_exact() {
        let a = Bounds::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut b = a;
        assert_eq!(a, b);
        b.left += 1e-9;
        assert_ne!(a, b, "no epsilon tolerance");
    }

    #[test]
    fn headless_default_is_1280_by_800() {
        assert_eq!(Bounds::HEADLESS.size(), Size::new(1280.0, 800.0));
        assert_eq!(Bounds::HEADLESS.rect(), Rect::new(0.0, 0.0, 1280.0, 800.0));
    }

    #[test]
    fn scroll_container_detection() {
        assert!(!OverflowStyle::default().is_scroll_container());
        assert!(!OverflowStyle::uniform(Overflow::Hidden).is_scroll_container());
        assert!(OverflowStyle::uniform(Overflow::Auto).is_scroll_container());
        let y_only = OverflowStyle {
            overflow_y: Overflow::Scroll,
            ..Default::default()
        };
        assert!(y_only.is_scroll_container());
    }
}
