// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages for the command line.
//
// Every technical error is mapped to a one-line summary and a suggestion the
// person running the scan can act on.

use crate::error::FolioscanError;

/// Whether running the scan again can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The reader or network misbehaved; running again may succeed.
    Transient,
    /// The user must change something (URL, login, permissions, config).
    ActionRequired,
    /// The reader showed something Folioscan does not understand.
    Permanent,
}

/// A human-readable error with a plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `FolioscanError` into a `HumanError`.
pub fn humanize_error(err: &FolioscanError) -> HumanError {
    match err {
        FolioscanError::InvalidLocator {
            expected_prefix, ..
        } => HumanError {
            message: "That address is not a book in the online reader.".into(),
            suggestion: format!(
                "Open the book in the reader and copy its address; it should start with {expected_prefix}"
            ),
            severity: Severity::ActionRequired,
        },

        FolioscanError::UnexpectedNavigationState {
            signal, chapter, ..
        } => HumanError {
            message: "The reader showed a page-turn control Folioscan does not recognise.".into(),
            suggestion: format!(
                "The reader may have changed its layout. Nothing was saved. (Saw {signal:?} in chapter {chapter:?}.)"
            ),
            severity: Severity::Permanent,
        },

        FolioscanError::AuthorizationTimeout { waited } => HumanError {
            message: "Login was not completed in time.".into(),
            suggestion: format!(
                "Scan the login code within {} seconds, then try again.",
                waited.as_secs()
            ),
            severity: Severity::ActionRequired,
        },

        FolioscanError::EmptyInput => HumanError {
            message: "No pages were captured.".into(),
            suggestion: "Check that the book opens in the reader and that you are logged in if it requires it.".into(),
            severity: Severity::Transient,
        },

        FolioscanError::AssemblyIo { path, .. } => HumanError {
            message: "The PDF could not be saved.".into(),
            suggestion: format!(
                "Make sure {} is writable and the disk has free space.",
                path.display()
            ),
            severity: Severity::ActionRequired,
        },

        FolioscanError::PdfError(detail) | FolioscanError::ImageError(detail) => HumanError {
            message: "A captured page could not be processed.".into(),
            suggestion: format!("Run the scan again with --debug to keep the captures. ({detail})"),
            severity: Severity::Transient,
        },

        FolioscanError::Bridge(detail) => HumanError {
            message: "The browser stopped responding as expected.".into(),
            suggestion: format!("Check that Chrome or Chromium is installed and try again. ({detail})"),
            severity: Severity::Transient,
        },

        FolioscanError::Config(detail) => HumanError {
            message: "The configuration is not valid.".into(),
            suggestion: detail.clone(),
            severity: Severity::ActionRequired,
        },

        FolioscanError::Io(io_err) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check the save and staging directories. ({io_err})"),
            severity: Severity::ActionRequired,
        },

        FolioscanError::Serialization(detail) => HumanError {
            message: "The scan manifest could not be written.".into(),
            suggestion: format!("{detail}"),
            severity: Severity::Transient,
        },
    }
}
