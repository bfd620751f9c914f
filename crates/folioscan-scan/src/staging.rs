// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Staging directory for raw captures.
//
// Layout: `<staging_root>/<document>/context/<chapter>_<page>.png`. When two
// chapter labels sanitize to the same text the global sequence is appended
// instead of overwriting an earlier capture.

use std::path::{Path, PathBuf};

use folioscan_core::error::{FolioscanError, Result};
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Name of the subdirectory holding page captures.
const CONTEXT_DIR: &str = "context";

/// Written next to the captures when staging is retained.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Per-document working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingArea {
    root: PathBuf,
    context: PathBuf,
    /// Set when `prepare` had to create the staging root itself.
    owns_staging_root: bool,
}

impl StagingArea {
    /// Create a fresh staging area for `document_name` under `staging_root`.
    ///
    /// Captures left behind by an earlier run of the same document are
    /// discarded.
    pub fn prepare(staging_root: &Path, document_name: &str) -> Result<Self> {
        let root = staging_root.join(document_name);
        let context = root.join(CONTEXT_DIR);
        let owns_staging_root = !staging_root.exists();

        if context.exists() {
            debug!(path = %context.display(), "Clearing stale captures");
            std::fs::remove_dir_all(&context)?;
        }
        std::fs::create_dir_all(&context)?;

        Ok(Self {
            root,
            context,
            owns_staging_root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn context_dir(&self) -> &Path {
        &self.context
    }

    /// Path for a capture, avoiding any file already staged.
    pub fn page_path(&self, chapter: &str, page_index: u32, sequence: u32) -> PathBuf {
        let preferred = self.context.join(format!("{chapter}_{page_index}.png"));
        if preferred.exists() {
            self.context
                .join(format!("{chapter}_{page_index}_{sequence}.png"))
        } else {
            preferred
        }
    }

    /// Save `image` as a PNG and return where it went.
    pub fn stage(
        &self,
        image: &DynamicImage,
        chapter: &str,
        page_index: u32,
        sequence: u32,
    ) -> Result<PathBuf> {
        let path = self.page_path(chapter, page_index, sequence);
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|err| {
                FolioscanError::ImageError(format!(
                    "failed to stage capture {}: {}",
                    path.display(),
                    err
                ))
            })?;
        Ok(path)
    }

    /// Serialise `record` as pretty JSON into the staging root.
    pub fn write_manifest<T: Serialize>(&self, record: &T) -> Result<PathBuf> {
        let path = self.root.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)?;
        info!("Manifest written to {}", path.display());
        Ok(path)
    }

    /// Delete the staging area, and the root above it when `prepare` created
    /// that root and nothing else is left in it.
    pub fn remove(&self) -> Result<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
            debug!(path = %self.root.display(), "Staging removed");
        }
        if let Some(parent) = self.root.parent().filter(|_| self.owns_staging_root) {
            // Only succeeds when no other document is staged there.
            if std::fs::remove_dir(parent).is_ok() {
                debug!(path = %parent.display(), "Staging root removed");
            }
        }
        Ok(())
    }

    /// Remove, logging instead of failing; used on error paths.
    pub fn discard(&self) {
        if let Err(err) = self.remove() {
            warn!(error = %err, path = %self.root.display(), "Failed to remove staging");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn blank() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([255])))
    }

    #[test]
    fn prepare_creates_context_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staging = StagingArea::prepare(dir.path(), "Book").expect("prepare");
        assert_eq!(staging.context_dir(), dir.path().join("Book").join("context"));
        assert!(staging.context_dir().is_dir());
    }

    #[test]
    fn prepare_discards_stale_captures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = StagingArea::prepare(dir.path(), "Book").expect("prepare");
        first.stage(&blank(), "Ch1", 1, 1).expect("stage");

        let second = StagingArea::prepare(dir.path(), "Book").expect("prepare");
        assert_eq!(
            std::fs::read_dir(second.context_dir()).expect("read").count(),
            0
        );
    }

    #[test]
    fn pages_are_named_by_chapter_and_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staging = StagingArea::prepare(dir.path(), "Book").expect("prepare");
        let path = staging.stage(&blank(), "Preface", 2, 2).expect("stage");
        assert_eq!(path, staging.context_dir().join("Preface_2.png"));
        assert!(path.is_file());
    }

    #[test]
    fn collisions_append_sequence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staging = StagingArea::prepare(dir.path(), "Book").expect("prepare");
        let first = staging.stage(&blank(), "Notes", 1, 4).expect("stage");
        let second = staging.stage(&blank(), "Notes", 1, 9).expect("stage");
        assert_ne!(first, second);
        assert_eq!(second, staging.context_dir().join("Notes_1_9.png"));
        assert!(first.is_file() && second.is_file());
    }

    #[test]
    fn manifest_is_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staging = StagingArea::prepare(dir.path(), "Book").expect("prepare");
        let path = staging
            .write_manifest(&serde_json::json!({ "pages": 3 }))
            .expect("manifest");
        let text = std::fs::read_to_string(path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("parse");
        assert_eq!(value["pages"], 3);
    }

    #[test]
    fn remove_deletes_document_dir_and_empty_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("wrs-temp");
        let staging = StagingArea::prepare(&root, "Book").expect("prepare");
        staging.stage(&blank(), "Ch1", 1, 1).expect("stage");

        staging.remove().expect("remove");
        assert!(!staging.root().exists());
        assert!(!root.exists());
    }

    #[test]
    fn remove_keeps_existing_empty_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("scans");
        std::fs::create_dir(&root).expect("user root");
        let staging = StagingArea::prepare(&root, "Book").expect("prepare");

        staging.remove().expect("remove");
        assert!(!staging.root().exists());
        assert!(root.is_dir());
    }

    #[test]
    fn remove_keeps_root_with_other_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("wrs-temp");
        let a = StagingArea::prepare(&root, "A").expect("prepare");
        let _b = StagingArea::prepare(&root, "B").expect("prepare");

        a.remove().expect("remove");
        assert!(root.join("B").exists());
    }
}
