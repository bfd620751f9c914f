// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability traits a reader backend implements.
//
// Backends are driven by one session at a time, so every method takes
// `&mut self`. None of them retry; that policy belongs to the caller.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use folioscan_core::error::Result;
use folioscan_core::types::{DisplaySetting, NavigationAction};
use image::DynamicImage;

/// Grouping of every capability the traversal engine needs.
pub trait ReaderBridge: CaptureProvider + PageSignalReader {}

impl<T: CaptureProvider + PageSignalReader> ReaderBridge for T {}

/// Navigates the reader and captures what it shows.
#[async_trait]
pub trait CaptureProvider: Send {
    /// Load the document at `locator`.
    async fn navigate(&mut self, locator: &str) -> Result<()>;

    /// Capture the content region of the current view as a raw image.
    async fn capture_region(&mut self) -> Result<DynamicImage>;

    /// Apply one display normalization (theme, font size).
    async fn apply_display_setting(&mut self, setting: &DisplaySetting) -> Result<()>;

    /// Perform a navigation action. Issued exactly once per request.
    async fn issue_navigation_action(&mut self, action: NavigationAction) -> Result<()>;

    /// Start the manual login step and return once it has been completed.
    ///
    /// Anything the person needs to act on (such as a login code image) is
    /// written under `prompt_dir`. Implementations give up after `timeout`.
    async fn await_manual_authorization(&mut self, prompt_dir: &Path, timeout: Duration)
    -> Result<()>;
}

/// Reads textual state from the current view.
#[async_trait]
pub trait PageSignalReader: Send {
    async fn document_title(&mut self) -> Result<String>;

    async fn current_chapter_label(&mut self) -> Result<String>;

    /// Raw reading of the navigation control, or `None` when the control
    /// cannot be found on the page.
    async fn current_navigation_signal(&mut self) -> Result<Option<String>>;

    /// Whether every asset of the current view has finished loading.
    async fn assets_fully_loaded(&mut self) -> Result<bool>;
}
