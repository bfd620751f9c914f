// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session pipeline: optional login, traversal, binarization, assembly,
// and staging cleanup.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use folioscan_bridge::traits::{CaptureProvider, ReaderBridge};
use folioscan_core::config::ScanConfig;
use folioscan_core::error::{FolioscanError, Result};
use folioscan_core::types::{CapturedPage, SessionId, StopReason};
use folioscan_document::{DocumentAssembler, ImageProcessor, Threshold, process};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::engine::TraversalEngine;
use crate::staging::StagingArea;

/// One end-to-end scan of a document.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSession {
    pub id: SessionId,
    pub locator: String,
    /// Title as the reader shows it.
    pub title: String,
    /// Sanitized title used for file names.
    pub document_name: String,
    pub started_at: DateTime<Utc>,
    /// Captured pages in reading order.
    pub pages: Vec<CapturedPage>,
    pub stop_reason: StopReason,
    #[serde(skip)]
    pub staging: StagingArea,
}

impl ScanSession {
    pub fn new(
        locator: &str,
        title: String,
        document_name: String,
        started_at: DateTime<Utc>,
        pages: Vec<CapturedPage>,
        stop_reason: StopReason,
        staging: StagingArea,
    ) -> Self {
        Self {
            id: SessionId::new(),
            locator: locator.to_owned(),
            title,
            document_name,
            started_at,
            pages,
            stop_reason,
            staging,
        }
    }
}

/// What a finished scan produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub session: ScanSession,
    pub output_path: PathBuf,
    pub page_count: usize,
    /// Set when staged captures were kept.
    pub manifest_path: Option<PathBuf>,
}

/// Binarization level chosen by the config.
pub fn threshold_for(config: &ScanConfig) -> Threshold {
    if config.otsu {
        Threshold::Otsu
    } else {
        Threshold::Fixed(config.binary_threshold)
    }
}

/// Run the manual login step, bounded by the configured timeout.
///
/// The timeout is enforced here as well as inside the bridge, so a bridge
/// that never returns still ends the wait.
#[instrument(skip_all)]
pub async fn authorize<P>(provider: &mut P, config: &ScanConfig) -> Result<()>
where
    P: CaptureProvider + ?Sized,
{
    let timeout = config.authorization_timeout();
    info!(?timeout, "Waiting for manual login");
    match tokio::time::timeout(
        timeout,
        provider.await_manual_authorization(&config.staging_root, timeout),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(FolioscanError::AuthorizationTimeout { waited: timeout }),
    }
}

/// Scan the document at `locator` and write `<save_dir>/<name>.pdf`.
#[instrument(skip(bridge, config))]
pub async fn scan_to_pdf<B>(bridge: &mut B, config: &ScanConfig, locator: &str) -> Result<ScanOutcome>
where
    B: ReaderBridge + ?Sized,
{
    config.validate()?;

    if config.require_login {
        authorize(&mut *bridge, config).await?;
    }

    let session = TraversalEngine::new(&mut *bridge, config)
        .run(locator)
        .await?;

    let assembled = write_document(&session, config);
    let manifest_path = if config.keep_staging {
        Some(session.staging.write_manifest(&session)?)
    } else {
        session.staging.discard();
        None
    };
    let (output_path, page_count) = assembled?;

    info!(
        path = %output_path.display(),
        pages = page_count,
        "Scan finished"
    );

    Ok(ScanOutcome {
        session,
        output_path,
        page_count,
        manifest_path,
    })
}

/// Binarize every staged capture and assemble them into the output PDF.
#[instrument(skip_all, fields(document = %session.document_name, pages = session.pages.len()))]
pub fn write_document(session: &ScanSession, config: &ScanConfig) -> Result<(PathBuf, usize)> {
    let threshold = threshold_for(config);
    let mut assembler = DocumentAssembler::new(&session.title, config.quality);

    for page in &session.pages {
        let raw = ImageProcessor::open(&page.path)?.into_dynamic();
        assembler.add_page(&process(&raw, threshold))?;
    }
    let document = assembler.finish()?;

    let output_path = config.output_path(&session.document_name);
    if let Err(source) = std::fs::create_dir_all(&config.save_dir) {
        warn!(error = %source, "Save directory could not be created");
        return Err(FolioscanError::AssemblyIo {
            path: output_path,
            source,
        });
    }
    document.write_to(&output_path)?;

    Ok((output_path, document.page_count))
}
