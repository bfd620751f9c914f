// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted reader bridge for engine and pipeline tests.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use folioscan_bridge::traits::{CaptureProvider, PageSignalReader};
use folioscan_core::config::ScanConfig;
use folioscan_core::error::{FolioscanError, Result};
use folioscan_core::types::{DisplaySetting, NavigationAction};
use image::{DynamicImage, GrayImage, Luma};

/// A config pointing into `dir` with waits short enough for tests.
pub fn test_config(dir: &Path) -> ScanConfig {
    ScanConfig {
        save_dir: dir.join("out"),
        staging_root: dir.join("staging"),
        asset_poll_frequency: 200,
        asset_max_wait_ms: 40,
        ..ScanConfig::default()
    }
}

/// Every collaborator call the scripted reader saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Navigate(String),
    Apply(DisplaySetting),
    Action(NavigationAction),
    Capture,
    Authorize,
    Title,
    Label,
    Signal,
    AssetProbe,
}

/// Plays back chapter labels and navigation signals, one per capture.
///
/// Labels repeat the last entry once exhausted; an exhausted signal list
/// reads as a missing navigation control.
pub struct ScriptedReader {
    title: String,
    labels: VecDeque<String>,
    last_label: String,
    signals: VecDeque<String>,
    assets_ready_after: Option<u32>,
    asset_probes_this_page: u32,
    failing_captures: u32,
    failing_action: Option<NavigationAction>,
    hanging_authorization: bool,
    captures: u32,
    calls: Vec<Call>,
}

impl ScriptedReader {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            labels: VecDeque::new(),
            last_label: "Chapter".to_owned(),
            signals: VecDeque::new(),
            assets_ready_after: Some(1),
            asset_probes_this_page: 0,
            failing_captures: 0,
            failing_action: None,
            hanging_authorization: false,
            captures: 0,
            calls: Vec::new(),
        }
    }

    pub fn chapters<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn signals<I, S>(mut self, signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signals = signals.into_iter().map(Into::into).collect();
        self
    }

    /// Report assets loaded on the `probes`-th probe of each page.
    pub fn assets_ready_after(mut self, probes: u32) -> Self {
        self.assets_ready_after = Some(probes);
        self
    }

    pub fn assets_never_ready(mut self) -> Self {
        self.assets_ready_after = None;
        self
    }

    /// Fail the first `count` capture attempts.
    pub fn failing_captures(mut self, count: u32) -> Self {
        self.failing_captures = count;
        self
    }

    pub fn failing_action(mut self, action: NavigationAction) -> Self {
        self.failing_action = Some(action);
        self
    }

    pub fn hanging_authorization(mut self) -> Self {
        self.hanging_authorization = true;
        self
    }

    /// Width of the `sequence`-th successful capture.
    pub fn capture_width(sequence: u32) -> u32 {
        40 + sequence * 3
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn actions(&self) -> Vec<NavigationAction> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Action(action) => Some(*action),
                _ => None,
            })
            .collect()
    }

    pub fn capture_attempts(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Capture).count()
    }

    pub fn asset_probes(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::AssetProbe).count()
    }
}

#[async_trait]
impl CaptureProvider for ScriptedReader {
    async fn navigate(&mut self, locator: &str) -> Result<()> {
        self.calls.push(Call::Navigate(locator.to_owned()));
        Ok(())
    }

    async fn capture_region(&mut self) -> Result<DynamicImage> {
        self.calls.push(Call::Capture);
        if self.failing_captures > 0 {
            self.failing_captures -= 1;
            return Err(FolioscanError::Bridge("screenshot failed".to_owned()));
        }

        self.captures += 1;
        self.asset_probes_this_page = 0;
        let width = Self::capture_width(self.captures);
        Ok(DynamicImage::ImageLuma8(GrayImage::from_fn(
            width,
            60,
            |x, y| Luma([((x * 7 + y * 3) % 256) as u8]),
        )))
    }

    async fn apply_display_setting(&mut self, setting: &DisplaySetting) -> Result<()> {
        self.calls.push(Call::Apply(*setting));
        Ok(())
    }

    async fn issue_navigation_action(&mut self, action: NavigationAction) -> Result<()> {
        self.calls.push(Call::Action(action));
        if self.failing_action == Some(action) {
            return Err(FolioscanError::Bridge(format!("{action:?} failed")));
        }
        Ok(())
    }

    async fn await_manual_authorization(
        &mut self,
        _prompt_dir: &Path,
        _timeout: Duration,
    ) -> Result<()> {
        self.calls.push(Call::Authorize);
        if self.hanging_authorization {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(())
    }
}

#[async_trait]
impl PageSignalReader for ScriptedReader {
    async fn document_title(&mut self) -> Result<String> {
        self.calls.push(Call::Title);
        Ok(self.title.clone())
    }

    async fn current_chapter_label(&mut self) -> Result<String> {
        self.calls.push(Call::Label);
        if let Some(label) = self.labels.pop_front() {
            self.last_label = label;
        }
        Ok(self.last_label.clone())
    }

    async fn current_navigation_signal(&mut self) -> Result<Option<String>> {
        self.calls.push(Call::Signal);
        Ok(self.signals.pop_front())
    }

    async fn assets_fully_loaded(&mut self) -> Result<bool> {
        self.calls.push(Call::AssetProbe);
        self.asset_probes_this_page += 1;
        Ok(self
            .assets_ready_after
            .is_some_and(|after| self.asset_probes_this_page >= after))
    }
}
