// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folioscan-document: Page post-processing and PDF assembly for Folioscan.
//
// Turns staged captures into black/white pages and packs them, in order, into
// a single PDF. Also provides a small inspector used to verify written output.

pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `folioscan_document::DocumentAssembler` etc.
pub use image::processor::{ImageProcessor, Threshold, process};
pub use pdf::reader::PdfInspector;
pub use pdf::writer::{AssembledDocument, DocumentAssembler, assemble};
