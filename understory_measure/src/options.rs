// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration for a [`Measure`](crate::measure::Measure).
//!
//! Options are fixed when the measurement is created. Start from
//! [`MeasureOptions::default`] and chain the builder methods:
//!
//! ```
//! use core::time::Duration;
//! use understory_measure::options::{Debounce, MeasureOptions};
//!
//! let options: MeasureOptions<u32> = MeasureOptions::default()
//!     .with_scroll(true)
//!     .with_debounce(Debounce::Split {
//!         scroll: Duration::from_millis(10),
//!         resize: Duration::from_millis(50),
//!     })
//!     .with_throttle(Duration::from_millis(100))
//!     .on_resize(|bounds| {
//!         let _ = bounds.width;
//!     });
//! assert!(options.scroll);
//! ```

use alloc::rc::Rc;
use core::time::Duration;

use crate::host::ObserverFactory;
use crate::types::{Bounds, Trigger};

/// Callback receiving a published bounds record.
pub type BoundsCallback = Rc<dyn Fn(Bounds)>;

/// Debounce delay for the two notification paths.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Debounce {
    /// The same delay on both paths.
    All(Duration),
    /// Independent delays.
    Split {
        /// Delay on the scroll path.
        scroll: Duration,
        /// Delay on the resize path.
        resize: Duration,
    },
}

impl Debounce {
    /// Same delay on both paths, in milliseconds.
    pub const fn millis(ms: u64) -> Self {
        Self::All(Duration::from_millis(ms))
    }

    /// Delay for one path. A zero delay means no debouncing.
    pub fn for_trigger(self, trigger: Trigger) -> Option<Duration> {
        let delay = match (self, trigger) {
            (Self::All(d), _) => d,
            (Self::Split { scroll, .. }, Trigger::Scroll) => scroll,
            (Self::Split { resize, .. }, Trigger::Resize) => resize,
        };
        (!delay.is_zero()).then_some(delay)
    }
}

impl From<Duration> for Debounce {
    fn from(delay: Duration) -> Self {
        Self::All(delay)
    }
}

/// Measurement configuration.
pub struct MeasureOptions<E> {
    /// Delay before a trigger is acted upon.
    pub debounce: Option<Debounce>,
    /// Minimum interval between accepted trigger executions.
    pub throttle: Option<Duration>,
    /// Watch scroll on scroll-container ancestors and on the window.
    pub scroll: bool,
    /// Report the layout-box (offset) width and height instead of the bounding rect's.
    ///
    /// Useful when transforms should not affect the reported size.
    pub offset_size: bool,
    /// Watch the element's subtree for structural changes as an extra resize trigger.
    pub observe_children: bool,
    /// Invoked on every accepted update from the resize path.
    pub on_resize: Option<BoundsCallback>,
    /// Invoked on every accepted update from the scroll path.
    pub on_scroll: Option<BoundsCallback>,
    /// Invoked on every accepted update from any path, including attach and refresh.
    pub on_change: Option<BoundsCallback>,
    /// Size-observer factory used instead of the host's native one.
    pub polyfill: Option<Rc<dyn ObserverFactory<E>>>,
}

impl<E> Default for MeasureOptions<E> {
    fn default() -> Self {
        Self {
            debounce: None,
            throttle: None,
            scroll: false,
            offset_size: false,
            observe_children: false,
            on_resize: None,
            on_scroll: None,
            on_change: None,
            polyfill: None,
        }
    }
}

impl<E> core::fmt::Debug for MeasureOptions<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MeasureOptions")
            .field("debounce", &self.debounce)
            .field("throttle", &self.throttle)
            .field("scroll", &self.scroll)
            .field("offset_size", &self.offset_size)
            .field("observe_children", &self.observe_children)
            .field("on_resize", &self.on_resize.is_some())
            .field("on_scroll", &self.on_scroll.is_some())
            .field("on_change", &self.on_change.is_some())
            .field("polyfill", &self.polyfill.is_some())
            .finish()
    }
}

impl<E> MeasureOptions<E> {
    /// Set the debounce delay (a single [`Duration`] applies to both paths).
    #[must_use]
    pub fn with_debounce(mut self, debounce: impl Into<Debounce>) -> Self {
        self.debounce = Some(debounce.into());
        self
    }

    /// Set the throttle interval.
    #[must_use]
    pub fn with_throttle(mut self, interval: Duration) -> Self {
        self.throttle = Some(interval);
        self
    }

    /// Enable or disable scroll watching.
    #[must_use]
    pub fn with_scroll(mut self, scroll: bool) -> Self {
        self.scroll = scroll;
        self
    }

    /// Enable or disable offset-size reporting.
    #[must_use]
    pub fn with_offset_size(mut self, offset_size: bool) -> Self {
        self.offset_size = offset_size;
        self
    }

    /// Enable or disable subtree mutation watching.
    #[must_use]
    pub fn with_observe_children(mut self, observe_children: bool) -> Self {
        self.observe_children = observe_children;
        self
    }

    /// Supply a replacement size-observer factory.
    #[must_use]
    pub fn with_polyfill(mut self, polyfill: Rc<dyn ObserverFactory<E>>) -> Self {
        self.polyfill = Some(polyfill);
        self
    }

    /// Set the resize-path callback.
    #[must_use]
    pub fn on_resize(mut self, f: impl Fn(Bounds) + 'static) -> Self {
        self.on_resize = Some(Rc::new(f));
        self
    }

    /// Set the scroll-path callback.
    #[must_use]
    pub fn on_scroll(mut self, f: impl Fn(Bounds) + 'static) -> Self {
        self.on_scroll = Some(Rc::new(f));
        self
    }

    /// Set the callback run on every accepted update.
    #[must_use]
    pub fn on_change(mut self, f: impl Fn(Bounds) + 'static) -> Self {
        self.on_change = Some(Rc::new(f));
        self
    }

    /// Effective throttle interval; zero means none.
    pub fn throttle_interval(&self) -> Option<Duration> {
        self.throttle.filter(|d| !d.is_zero())
    }

    /// Effective debounce delay for one path; zero means none.
    pub fn debounce_delay(&self, trigger: Trigger) -> Option<Duration> {
        self.debounce.and_then(|d| d.for_trigger(trigger))
    }

    /// The callback for one path.
    pub fn callback(&self, trigger: Trigger) -> Option<&BoundsCallback> {
        match trigger {
            Trigger::Resize => self.on_resize.as_ref(),
            Trigger::Scroll => self.on_scroll.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_debounce_picks_per_path() {
        let d = Debounce::Split {
            scroll: Duration::from_millis(5),
            resize: Duration::from_millis(40),
        };
        assert_eq!(
            d.for_trigger(Trigger::Scroll),
            Some(Duration::from_millis(5))
        );
        assert_eq!(
            d.for_trigger(Trigger::Resize),
            Some(Duration::from_millis(40))
        );
    }

    #[test]
    fn zero_durations_disable_rate_limiting() {
        let o: MeasureOptions<u32> = MeasureOptions::default()
            .with_debounce(Duration::ZERO)
            .with_throttle(Duration::ZERO);
        assert_eq!(o.debounce_delay(Trigger::Resize), None);
        assert_eq!(o.debounce_delay(Trigger::Scroll), None);
        assert_eq!(o.throttle_interval(), None);

        let split = Debounce::Split {
            scroll: Duration::ZERO,
            resize: Duration::from_millis(1),
        };
        assert_eq!(split.for_trigger(Trigger::Scroll), None);
        assert!(split.for_trigger(Trigger::Resize).is_some());
    }

    #[test]
    fn builder_sets_fields() {
        let o: MeasureOptions<u32> = MeasureOptions::default()
            .with_debounce(Debounce::millis(30))
            .with_scroll(true)
            .with_offset_size(true)
            .with_observe_children(true)
            .on_scroll(|_| {});
        assert_eq!(o.debounce, Some(Debounce::All(Duration::from_millis(30))));
        assert!(o.scroll && o.offset_size && o.observe_children);
        assert!(o.callback(Trigger::Scroll).is_some());
        assert!(o.callback(Trigger::Resize).is_none());
        assert!(o.on_change.is_none());
    }

    #[test]
    fn defaults_are_all_off() {
        let o: MeasureOptions<u32> = MeasureOptions::default();
        assert!(o.debounce.is_none() && o.throttle.is_none());
        assert!(!o.scroll && !o.offset_size && !o.observe_children);
        assert!(o.polyfill.is_none());
    }
}
