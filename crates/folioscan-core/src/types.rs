// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for a Folioscan session.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the reader says happens after the current view.
///
/// Read fresh after every capture. The textual forms are the canonical
/// readings a bridge reports; anything else is rejected by [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationSignal {
    /// The next view continues the current chapter.
    SameChapter,
    /// The next view starts a new chapter.
    NextChapter,
    /// This is the last view of the document.
    End,
}

impl NavigationSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SameChapter => "SAME_CHAPTER",
            Self::NextChapter => "NEXT_CHAPTER",
            Self::End => "END",
        }
    }
}

impl std::fmt::Display for NavigationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a raw signal reading matches no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSignal(pub String);

impl FromStr for NavigationSignal {
    type Err = UnknownSignal;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "SAME_CHAPTER" => Ok(Self::SameChapter),
            "NEXT_CHAPTER" => Ok(Self::NextChapter),
            "END" => Ok(Self::End),
            other => Err(UnknownSignal(other.to_owned())),
        }
    }
}

/// Actions the traversal engine asks the capture provider to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationAction {
    /// Turn to the next page of the current chapter.
    NextPage,
    /// Jump to the first page of the next chapter.
    NextChapter,
    /// Leave the cover and open the first body chapter (setup only).
    OpenContent,
}

/// Reader colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

/// One-time display normalization applied before the first capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplaySetting {
    Theme(Theme),
    /// Font size level, 1 (smallest) to 7 (largest).
    FontSize(u8),
}

impl DisplaySetting {
    /// Setting name as reported in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Theme(_) => "theme",
            Self::FontSize(_) => "font_size",
        }
    }

    /// Setting value as reported in logs.
    pub fn value(&self) -> String {
        match self {
            Self::Theme(Theme::Light) => "light".to_owned(),
            Self::Theme(Theme::Dark) => "dark".to_owned(),
            Self::FontSize(level) => level.to_string(),
        }
    }
}

/// A single captured view staged on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPage {
    /// Sanitized chapter label the page was captured under.
    pub chapter: String,
    /// 1-based index within the chapter.
    pub page_index: u32,
    /// 1-based position within the whole session.
    pub sequence: u32,
    /// Staged PNG holding the raw capture.
    pub path: PathBuf,
}

/// Why a traversal reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The reader reported the end of the document.
    EndOfDocument,
    /// The navigation control could not be found; treated as the end.
    NavigationMissing,
}
