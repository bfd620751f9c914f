// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Traversal engine: walks a document page by page and chapter by chapter.
//
// The engine decides what to capture, when to advance and when to stop. It
// holds the bridge exclusively for the whole run; every collaborator call is
// awaited before the next one is issued.

use chrono::Utc;
use folioscan_bridge::traits::ReaderBridge;
use folioscan_core::config::ScanConfig;
use folioscan_core::error::{FolioscanError, Result};
use folioscan_core::sanitize::sanitize_component;
use folioscan_core::types::{CapturedPage, NavigationAction, NavigationSignal, StopReason};
use tracing::{debug, info, instrument, warn};

use crate::session::ScanSession;
use crate::staging::StagingArea;
use crate::wait::{PollSchedule, WaitOutcome, capture_with_retry, wait_for_assets};

/// Where the engine is in its walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    Capturing,
    Advancing(NavigationAction),
    /// Terminal.
    Done(StopReason),
}

/// Drives one traversal over a borrowed bridge.
pub struct TraversalEngine<'a, B: ReaderBridge + ?Sized> {
    bridge: &'a mut B,
    config: &'a ScanConfig,
    state: EngineState,
}

impl<'a, B: ReaderBridge + ?Sized> TraversalEngine<'a, B> {
    pub fn new(bridge: &'a mut B, config: &'a ScanConfig) -> Self {
        Self {
            bridge,
            config,
            state: EngineState::Init,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Capture every page of the document at `locator`, in reading order.
    ///
    /// On a fatal error the staged captures are removed unless the config
    /// asks for them to be kept.
    #[instrument(skip(self))]
    pub async fn run(&mut self, locator: &str) -> Result<ScanSession> {
        validate_locator(locator, &self.config.reader_url_prefix)?;
        self.state = EngineState::Init;
        let started_at = Utc::now();

        self.bridge.navigate(locator).await?;
        for setting in self.config.display_settings() {
            debug!(setting = setting.name(), value = %setting.value(), "Applying display setting");
            self.bridge.apply_display_setting(&setting).await?;
        }
        self.bridge
            .issue_navigation_action(NavigationAction::OpenContent)
            .await?;

        let title = self.bridge.document_title().await?;
        let document_name = sanitize_component(&title);
        info!(title = %title, name = %document_name, "Scanning document");

        let staging = StagingArea::prepare(&self.config.staging_root, &document_name)?;

        match self.traverse(locator, &staging).await {
            Ok((pages, stop_reason)) => {
                self.state = EngineState::Done(stop_reason);
                info!(reason = ?stop_reason, pages = pages.len(), "Traversal finished");
                Ok(ScanSession::new(
                    locator,
                    title,
                    document_name,
                    started_at,
                    pages,
                    stop_reason,
                    staging,
                ))
            }
            Err(err) => {
                if !self.config.keep_staging {
                    staging.discard();
                }
                Err(err)
            }
        }
    }

    async fn traverse(
        &mut self,
        locator: &str,
        staging: &StagingArea,
    ) -> Result<(Vec<CapturedPage>, StopReason)> {
        let schedule = PollSchedule::from_config(self.config);
        let mut pages: Vec<CapturedPage> = Vec::new();
        let mut page_index = 1u32;
        let mut last_label: Option<String> = None;

        loop {
            self.state = EngineState::Capturing;

            let label = self.bridge.current_chapter_label().await?;
            if last_label.as_deref() != Some(label.as_str()) {
                if last_label.is_some() {
                    page_index = 1;
                }
                info!(chapter = %label, "Chapter started");
                last_label = Some(label.clone());
            }
            let chapter = sanitize_component(&label);

            if let WaitOutcome::TimedOut { waited, .. } =
                wait_for_assets(&mut *self.bridge, &schedule).await?
            {
                warn!(chapter = %chapter, page = page_index, ?waited, "Assets still loading, capturing anyway");
            }

            let image = capture_with_retry(&mut *self.bridge, &schedule).await?;
            let sequence = pages.len() as u32 + 1;
            let path = staging.stage(&image, &chapter, page_index, sequence)?;
            info!(chapter = %chapter, page = page_index, sequence, "Page captured");
            pages.push(CapturedPage {
                chapter: chapter.clone(),
                page_index,
                sequence,
                path,
            });

            let Some(raw) = self.bridge.current_navigation_signal().await? else {
                info!(reason = ?StopReason::NavigationMissing, "Navigation control not found");
                return Ok((pages, StopReason::NavigationMissing));
            };

            let signal: NavigationSignal =
                raw.parse()
                    .map_err(|_| FolioscanError::UnexpectedNavigationState {
                        signal: raw.clone(),
                        locator: locator.to_owned(),
                        chapter: chapter.clone(),
                        page_index,
                    })?;

            let action = match signal {
                NavigationSignal::End => return Ok((pages, StopReason::EndOfDocument)),
                NavigationSignal::NextChapter => {
                    page_index = 1;
                    NavigationAction::NextChapter
                }
                NavigationSignal::SameChapter => {
                    page_index += 1;
                    NavigationAction::NextPage
                }
            };

            self.state = EngineState::Advancing(action);
            debug!(signal = %signal, ?action, "Advancing");
            self.bridge.issue_navigation_action(action).await?;
        }
    }
}

/// Accept only reader URLs of the form `<prefix><book id>`.
pub fn validate_locator(locator: &str, prefix: &str) -> Result<()> {
    let book_id = locator
        .strip_prefix(prefix)
        .map(|rest| rest.split(['?', '#']).next().unwrap_or_default())
        .map(|id| id.trim_matches('/').trim())
        .unwrap_or_default();

    if book_id.is_empty() {
        return Err(FolioscanError::InvalidLocator {
            locator: locator.to_owned(),
            expected_prefix: prefix.to_owned(),
        });
    }
    Ok(())
}
