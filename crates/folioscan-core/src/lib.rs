// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folioscan: Core types, errors, and configuration shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod sanitize;
pub mod types;

pub use config::{BrowserSettings, ReaderSelectors, ScanConfig};
pub use error::{FolioscanError, Result};
pub use sanitize::sanitize_component;
pub use types::*;
