// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folioscan-scan: Traversal engine and scan-to-PDF pipeline.
//
// The engine walks a document through a `ReaderBridge`, staging one PNG per
// view; the session pipeline binarizes the captures and assembles the PDF.

pub mod engine;
pub mod session;
pub mod staging;
pub mod wait;

#[cfg(test)]
mod testing;

pub use engine::{EngineState, TraversalEngine, validate_locator};
pub use session::{ScanOutcome, ScanSession, authorize, scan_to_pdf, write_document};
pub use staging::StagingArea;
pub use wait::{PollSchedule, WaitOutcome};
