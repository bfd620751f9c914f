// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded polling for asset readiness and capture retries.
//
// Both loops share one schedule: probe, then sleep one poll interval, until the
// maximum wait has elapsed. Asset readiness never fails on expiry; a capture
// that keeps failing surfaces its last error.

use std::time::{Duration, Instant};

use folioscan_bridge::traits::{CaptureProvider, PageSignalReader};
use folioscan_core::config::ScanConfig;
use folioscan_core::error::Result;
use image::DynamicImage;
use tracing::{debug, warn};

/// Poll interval and overall bound for one waiting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    interval: Duration,
    max_wait: Duration,
}

impl PollSchedule {
    /// Poll `frequency_hz` times per second for at most `max_wait`.
    pub fn from_frequency(frequency_hz: u32, max_wait: Duration) -> Self {
        let interval = Duration::from_secs(1) / frequency_hz.max(1);
        Self { interval, max_wait }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::from_frequency(config.asset_poll_frequency, config.asset_max_wait())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Whether another interval still fits after `elapsed`.
    fn has_room(&self, elapsed: Duration) -> bool {
        elapsed + self.interval <= self.max_wait
    }
}

/// How an asset wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready { probes: u32 },
    TimedOut { probes: u32, waited: Duration },
}

/// Poll `reader` until it reports every asset loaded or the window closes.
pub async fn wait_for_assets<R>(reader: &mut R, schedule: &PollSchedule) -> Result<WaitOutcome>
where
    R: PageSignalReader + ?Sized,
{
    let started = Instant::now();
    let mut probes = 0u32;
    loop {
        probes += 1;
        if reader.assets_fully_loaded().await? {
            debug!(probes, "Assets loaded");
            return Ok(WaitOutcome::Ready { probes });
        }
        if !schedule.has_room(started.elapsed()) {
            return Ok(WaitOutcome::TimedOut {
                probes,
                waited: started.elapsed(),
            });
        }
        tokio::time::sleep(schedule.interval).await;
    }
}

/// Capture the current view, retrying failures within the same window.
pub async fn capture_with_retry<P>(provider: &mut P, schedule: &PollSchedule) -> Result<DynamicImage>
where
    P: CaptureProvider + ?Sized,
{
    let started = Instant::now();
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match provider.capture_region().await {
            Ok(image) => return Ok(image),
            Err(err) if schedule.has_room(started.elapsed()) => {
                warn!(attempt, error = %err, "Capture failed, retrying");
                tokio::time::sleep(schedule.interval).await;
            }
            Err(err) => {
                debug!(attempt, "Capture window exhausted");
                return Err(err);
            }
        }
    }
}
