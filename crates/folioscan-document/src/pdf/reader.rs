// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF inspector: read back an assembled document with `lopdf` to check its
// page count and page geometry.

use std::path::Path;

use folioscan_core::error::FolioscanError;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, instrument};

/// Read-only view over an existing PDF.
pub struct PdfInspector {
    document: Document,
}

impl PdfInspector {
    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FolioscanError> {
        let path_ref = path.as_ref();
        let document = Document::load(path_ref).map_err(|err| {
            FolioscanError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    /// Inspect PDF bytes already in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FolioscanError> {
        let document = Document::load_mem(data).map_err(|err| {
            FolioscanError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;
        Ok(Self { document })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// `(width, height)` of every page in points, in page order.
    pub fn page_sizes(&self) -> Result<Vec<(f32, f32)>, FolioscanError> {
        self.document
            .get_pages()
            .into_values()
            .map(|page_id| self.media_box(page_id))
            .collect()
    }

    /// Resolve a page's MediaBox, following `/Parent` for inherited values.
    fn media_box(&self, page_id: ObjectId) -> Result<(f32, f32), FolioscanError> {
        let mut current = page_id;
        loop {
            let dict = self.document.get_dictionary(current).map_err(pdf_err)?;

            if let Ok(entry) = dict.get(b"MediaBox") {
                let entry = match entry.as_reference() {
                    Ok(id) => self.document.get_object(id).map_err(pdf_err)?,
                    Err(_) => entry,
                };
                return box_size(entry);
            }

            current = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .map_err(|_| {
                    FolioscanError::PdfError(format!("page {page_id:?} has no MediaBox"))
                })?;
        }
    }
}

fn box_size(entry: &Object) -> Result<(f32, f32), FolioscanError> {
    let values = entry
        .as_array()
        .map_err(pdf_err)?
        .iter()
        .map(Object::as_float)
        .collect::<Result<Vec<f32>, _>>()
        .map_err(pdf_err)?;

    match values.as_slice() {
        [llx, lly, urx, ury] => Ok(((urx - llx).abs(), (ury - lly).abs())),
        _ => Err(FolioscanError::PdfError(format!(
            "MediaBox has {} entries, expected 4",
            values.len()
        ))),
    }
}

fn pdf_err(err: lopdf::Error) -> FolioscanError {
    FolioscanError::PdfError(err.to_string())
}
