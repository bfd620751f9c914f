// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan and browser configuration, loadable from a TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FolioscanError, Result};
use crate::types::{DisplaySetting, Theme};

/// Settings for one scan session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Locators must start with this prefix and carry a book id after it.
    pub reader_url_prefix: String,
    /// Directory receiving `<name>.pdf`.
    pub save_dir: PathBuf,
    /// Root of the per-session staging directories.
    pub staging_root: PathBuf,
    /// Global binarization level (0-255); pixels at or above it turn white.
    pub binary_threshold: u8,
    /// Derive the level from each page's histogram instead.
    pub otsu: bool,
    /// Output encoding fidelity, 0-100. 100 embeds pages losslessly.
    pub quality: u8,
    /// Reader font size level, 1 (smallest) to 7 (largest).
    pub font_size_index: u8,
    /// Reader theme selected before scanning. Binarization assumes dark text
    /// on a light page, so `dark` needs a matching threshold.
    pub theme: Theme,
    /// How often asset readiness is polled, in Hz.
    pub asset_poll_frequency: u32,
    /// Longest wait for a page's assets before capturing anyway.
    pub asset_max_wait_ms: u64,
    /// Longest wait for the manual login step.
    pub authorization_timeout_secs: u64,
    /// Run the manual login step before scanning.
    pub require_login: bool,
    /// Keep staged captures (and a manifest) after assembly.
    pub keep_staging: bool,
    /// Open the finished PDF with the system viewer.
    pub open_output: bool,
    pub browser: BrowserSettings,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            reader_url_prefix: "https://weread.qq.com/web/reader/".to_owned(),
            save_dir: PathBuf::from("."),
            staging_root: PathBuf::from("wrs-temp"),
            binary_threshold: 200,
            otsu: false,
            quality: 100,
            font_size_index: 1,
            theme: Theme::Light,
            asset_poll_frequency: 10,
            asset_max_wait_ms: 30_000,
            authorization_timeout_secs: 300,
            require_login: false,
            keep_staging: false,
            open_output: false,
            browser: BrowserSettings::default(),
        }
    }
}

impl ScanConfig {
    /// Load a config file; missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text).map_err(|err| {
            FolioscanError::Config(format!("{}: {}", path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.quality > 100 {
            return Err(FolioscanError::Config(format!(
                "quality must be within 0..=100, got {}",
                self.quality
            )));
        }
        if !(1..=7).contains(&self.font_size_index) {
            return Err(FolioscanError::Config(format!(
                "font_size_index must be within 1..=7, got {}",
                self.font_size_index
            )));
        }
        if self.asset_poll_frequency == 0 {
            return Err(FolioscanError::Config(
                "asset_poll_frequency must be at least 1 Hz".to_owned(),
            ));
        }
        if self.reader_url_prefix.trim().is_empty() {
            return Err(FolioscanError::Config(
                "reader_url_prefix must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn asset_max_wait(&self) -> Duration {
        Duration::from_millis(self.asset_max_wait_ms)
    }

    pub fn authorization_timeout(&self) -> Duration {
        Duration::from_secs(self.authorization_timeout_secs)
    }

    /// Display normalization to apply once, in order, before the first capture.
    pub fn display_settings(&self) -> Vec<DisplaySetting> {
        vec![
            DisplaySetting::Theme(self.theme),
            DisplaySetting::FontSize(self.font_size_index),
        ]
    }

    /// Where the assembled document for `name` is written.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.save_dir.join(format!("{name}.pdf"))
    }
}

/// How the Chromium collaborator is launched and how it finds page elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Explicit browser binary; auto-detected when unset.
    pub chrome_executable: Option<PathBuf>,
    /// Attach to an already running browser on this remote-debugging port.
    pub debug_port: Option<u16>,
    pub window_width: u32,
    pub window_height: u32,
    /// Longest wait for a page element to appear.
    pub patience_secs: u64,
    /// Pause after UI actions so the reader can re-render.
    pub settle_delay_ms: u64,
    pub home_url: String,
    pub selectors: ReaderSelectors,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            debug_port: None,
            window_width: 1280,
            window_height: 960,
            patience_secs: 30,
            settle_delay_ms: 1_000,
            home_url: "https://weread.qq.com/".to_owned(),
            selectors: ReaderSelectors::default(),
        }
    }
}

impl BrowserSettings {
    pub fn patience(&self) -> Duration {
        Duration::from_secs(self.patience_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// CSS selectors for the target reader, one per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSelectors {
    pub render_container: String,
    pub content: String,
    pub content_images: String,
    pub document_title: String,
    pub chapter_title: String,
    /// Matches either the page/chapter turn button or the ending marker.
    pub footer: String,
    /// Class fragment identifying the ending marker among `footer` matches.
    pub ending_class: String,
    pub next_page_text: String,
    pub next_chapter_text: String,
    pub catalog_button: String,
    pub first_chapter_item: String,
    pub font_size_button: String,
    /// `{index}` is replaced by the font size level.
    pub font_size_mark: String,
    pub light_theme_button: String,
    pub dark_theme_button: String,
    pub login_button: String,
    pub login_dialog: String,
    /// URL fragment present while the login step is pending.
    pub login_url_marker: String,
}

impl Default for ReaderSelectors {
    fn default() -> Self {
        Self {
            render_container: ".renderTargetContainer".to_owned(),
            content: ".app_content".to_owned(),
            content_images: "img.wr_absolute".to_owned(),
            document_title: "span.readerTopBar_title_link".to_owned(),
            chapter_title: "span.readerTopBar_title_chapter".to_owned(),
            footer: ".readerFooter_button,.readerFooter_ending".to_owned(),
            ending_class: "ending".to_owned(),
            next_page_text: "下一页".to_owned(),
            next_chapter_text: "下一章".to_owned(),
            catalog_button: "button.catalog".to_owned(),
            first_chapter_item: "li.chapterItem:nth-child(2)".to_owned(),
            font_size_button: "button.fontSizeButton".to_owned(),
            font_size_mark: ".vue-slider-mark:nth-child({index})".to_owned(),
            light_theme_button: "button.readerControls_item.white".to_owned(),
            dark_theme_button: "button.readerControls_item.dark".to_owned(),
            login_button: ".navBar_link_Login".to_owned(),
            login_dialog: ".login_dialog".to_owned(),
            login_url_marker: "login".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[test]
    fn display_settings_follow_flags() {
        let mut config = ScanConfig::default();
        assert_eq!(
            config.display_settings(),
            vec![
                DisplaySetting::Theme(Theme::Light),
                DisplaySetting::FontSize(1)
            ]
        );

        config.theme = Theme::Dark;
        config.font_size_index = 5;
        assert_eq!(
            config.display_settings(),
            vec![
                DisplaySetting::Theme(Theme::Dark),
                DisplaySetting::FontSize(5)
            ]
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = ScanConfig {
            quality: 101,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(FolioscanError::Config(_))));

        let config = ScanConfig {
            font_size_index: 8,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ScanConfig {
            asset_poll_frequency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("folioscan.toml");
        std::fs::write(
            &path,
            r#"
binary_threshold = 180
quality = 85
theme = "dark"

[browser]
headless = false
patience_secs = 10

[browser.selectors]
content = ".reader_content"
"#,
        )
        .expect("write config");

        let config = ScanConfig::load(&path).expect("load");
        assert_eq!(config.binary_threshold, 180);
        assert_eq!(config.quality, 85);
        assert_eq!(config.font_size_index, 1);
        assert_eq!(config.theme, Theme::Dark);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.patience(), Duration::from_secs(10));
        assert_eq!(config.browser.selectors.content, ".reader_content");
        assert_eq!(
            config.browser.selectors.footer,
            ReaderSelectors::default().footer
        );
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "quality = \"high\"").expect("write config");
        assert!(matches!(
            ScanConfig::load(&path),
            Err(FolioscanError::Config(_))
        ));
    }

    #[test]
    fn output_path_uses_pdf_extension() {
        let config = ScanConfig {
            save_dir: PathBuf::from("/books"),
            ..Default::default()
        };
        assert_eq!(config.output_path("Dune"), PathBuf::from("/books/Dune.pdf"));
    }
}
