// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folioscan: Reader bridge abstractions.
//
// The traversal engine only talks to a reader through the traits in `traits`.
// The `chromium` module drives a real browser over the DevTools protocol.

pub mod traits;

#[cfg(feature = "chromium")]
pub mod chromium;

pub use traits::{CaptureProvider, PageSignalReader, ReaderBridge};

#[cfg(feature = "chromium")]
pub use chromium::ChromiumReader;
