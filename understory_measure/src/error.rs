// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors a [`Host`](crate::host::Host) may report.
//!
//! Measurement never surfaces these to callers. The engine logs them and
//! degrades: a failed snapshot publishes nothing, a failed registration is
//! skipped.

use crate::host::EventKind;

/// Failure reported by a host capability.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum HostError {
    /// The element handle no longer refers to an element in the document.
    #[error("element is no longer part of the document")]
    Detached,
    /// The event target does not emit this kind of event.
    #[error("event target does not support {0:?} listeners")]
    UnsupportedEvent(EventKind),
}
