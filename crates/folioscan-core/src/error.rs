// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folioscan.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all Folioscan operations.
#[derive(Debug, Error)]
pub enum FolioscanError {
    // -- Traversal errors --
    #[error("invalid document locator {locator:?}: expected a URL starting with {expected_prefix:?}")]
    InvalidLocator {
        locator: String,
        expected_prefix: String,
    },

    #[error(
        "unexpected navigation state {signal:?} at chapter {chapter:?}, page {page_index} ({locator})"
    )]
    UnexpectedNavigationState {
        signal: String,
        locator: String,
        chapter: String,
        page_index: u32,
    },

    #[error("manual authorization not completed within {waited:?}")]
    AuthorizationTimeout { waited: Duration },

    // -- Document errors --
    #[error("nothing to assemble: no pages were captured")]
    EmptyInput,

    #[error("failed to write document to {}: {source}", path.display())]
    AssemblyIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Collaborators --
    #[error("reader bridge error: {0}")]
    Bridge(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioscanError>;
