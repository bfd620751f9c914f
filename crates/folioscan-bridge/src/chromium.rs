// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chromium reader bridge: drives the online reader through the Chrome
// DevTools protocol via `chromiumoxide`.
//
// Elements are located with the CSS selectors from `ReaderSelectors`. Lookups
// poll until the configured patience runs out; clicks go through JavaScript so
// overlays cannot swallow them.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, BrowserConfig, Page};
use folioscan_core::config::BrowserSettings;
use folioscan_core::error::{FolioscanError, Result};
use folioscan_core::types::{DisplaySetting, NavigationAction, NavigationSignal, Theme};
use futures::StreamExt;
use image::DynamicImage;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::traits::{CaptureProvider, PageSignalReader};

/// Interval between element lookups while waiting for one to appear.
const LOOKUP_INTERVAL: Duration = Duration::from_millis(200);

/// File the login prompt is written to inside the prompt directory.
const LOGIN_PROMPT_FILE: &str = "login_qrcode.png";

/// A browser tab showing the online reader.
pub struct ChromiumReader {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    settings: BrowserSettings,
    /// Attached to a browser someone else started; leave it running on close.
    attached: bool,
}

impl ChromiumReader {
    /// Launch a browser, or attach to one when `debug_port` is set.
    #[instrument(skip_all, fields(headless = settings.headless, debug_port = ?settings.debug_port))]
    pub async fn launch(settings: BrowserSettings) -> Result<Self> {
        let (browser, mut handler, attached) = match settings.debug_port {
            Some(port) => {
                let url = format!("http://localhost:{port}");
                info!("Attaching to browser at {url}");
                let (browser, handler) = Browser::connect(&url)
                    .await
                    .map_err(|err| bridge_err(format!("failed to connect to {url}"), err))?;
                (browser, handler, true)
            }
            None => {
                let config = browser_config(&settings)?;
                let (browser, handler) = Browser::launch(config)
                    .await
                    .map_err(|err| bridge_err("failed to launch browser", err))?;
                (browser, handler, false)
            }
        };

        // Drain CDP events in the background; the browser stalls otherwise.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| bridge_err("failed to open a tab", err))?;

        debug!("Browser ready");
        Ok(Self {
            browser,
            page,
            handler,
            settings,
            attached,
        })
    }

    /// Close the tab, and the browser too if it was launched here.
    pub async fn close(mut self) -> Result<()> {
        if self.attached {
            self.page
                .close()
                .await
                .map_err(|err| bridge_err("failed to close tab", err))?;
        } else {
            self.browser
                .close()
                .await
                .map_err(|err| bridge_err("failed to close browser", err))?;
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
        Ok(())
    }

    // -- Element helpers ------------------------------------------------------

    /// Wait up to the configured patience for `selector` to match.
    async fn find(&self, selector: &str) -> Result<Element> {
        self.find_optional(selector).await?.ok_or_else(|| {
            FolioscanError::Bridge(format!(
                "element {selector:?} did not appear within {:?}",
                self.settings.patience()
            ))
        })
    }

    /// Like [`Self::find`], but a missing element is `None` rather than an error.
    async fn find_optional(&self, selector: &str) -> Result<Option<Element>> {
        let deadline = Instant::now() + self.settings.patience();
        loop {
            match self.page.find_element(selector).await {
                Ok(element) => return Ok(Some(element)),
                Err(err) if Instant::now() >= deadline => {
                    debug!(selector, error = %err, "Element not found");
                    return Ok(None);
                }
                Err(_) => tokio::time::sleep(LOOKUP_INTERVAL).await,
            }
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self.find(selector).await?;
        click_element(&element, selector).await
    }

    async fn text_of(&self, selector: &str) -> Result<String> {
        let element = self.find(selector).await?;
        let text = element
            .inner_text()
            .await
            .map_err(|err| bridge_err(format!("failed to read text of {selector:?}"), err))?;
        Ok(text.unwrap_or_default().trim().to_owned())
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|err| bridge_err("script evaluation failed", err))?;
        result
            .into_value()
            .map_err(|err| bridge_err("unexpected script result", err))
    }

    async fn settle(&self) {
        tokio::time::sleep(self.settings.settle_delay()).await;
    }

    /// Grow the viewport so the whole rendered view fits in one capture.
    async fn fit_viewport_to_content(&self) -> Result<()> {
        let selector = js_string(&self.settings.selectors.render_container);
        let height: Option<f64> = self
            .eval(format!(
                "(() => {{ const el = document.querySelector({selector}); \
                 return el ? el.offsetTop + el.offsetHeight : null; }})()"
            ))
            .await?;

        let Some(height) = height else {
            return Err(FolioscanError::Bridge(format!(
                "render container {:?} not found",
                self.settings.selectors.render_container
            )));
        };

        let height = (height.ceil() as i64).max(i64::from(self.settings.window_height));
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(self.settings.window_width))
            .height(height)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|err| FolioscanError::Bridge(format!("invalid viewport metrics: {err}")))?;

        self.page
            .execute(params)
            .await
            .map_err(|err| bridge_err("failed to resize viewport", err))?;
        debug!(height, "Viewport fitted to content");
        Ok(())
    }

    async fn login_page_pending(&self) -> Result<bool> {
        let url = self
            .page
            .url()
            .await
            .map_err(|err| bridge_err("failed to read page URL", err))?
            .unwrap_or_default();
        Ok(url.contains(&self.settings.selectors.login_url_marker))
    }
}

#[async_trait]
impl CaptureProvider for ChromiumReader {
    #[instrument(skip(self))]
    async fn navigate(&mut self, locator: &str) -> Result<()> {
        self.page
            .goto(locator)
            .await
            .map_err(|err| bridge_err(format!("failed to open {locator}"), err))?;
        self.settle().await;
        Ok(())
    }

    async fn capture_region(&mut self) -> Result<DynamicImage> {
        self.fit_viewport_to_content().await?;
        self.settle().await;

        let content = self.find(&self.settings.selectors.content).await?;
        let png = content
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|err| bridge_err("screenshot failed", err))?;

        image::load_from_memory(&png)
            .map_err(|err| FolioscanError::ImageError(format!("undecodable capture: {err}")))
    }

    async fn apply_display_setting(&mut self, setting: &DisplaySetting) -> Result<()> {
        self.settle().await;
        let selectors = &self.settings.selectors;
        match setting {
            DisplaySetting::Theme(Theme::Light) => self.click(&selectors.light_theme_button).await,
            DisplaySetting::Theme(Theme::Dark) => self.click(&selectors.dark_theme_button).await,
            DisplaySetting::FontSize(level) => {
                self.click(&selectors.font_size_button).await?;
                self.settle().await;
                let mark = selectors
                    .font_size_mark
                    .replace("{index}", &level.to_string());
                self.click(&mark).await?;
                // Dismiss the slider.
                self.click(&selectors.content).await
            }
        }
    }

    async fn issue_navigation_action(&mut self, action: NavigationAction) -> Result<()> {
        let selectors = &self.settings.selectors;
        match action {
            NavigationAction::OpenContent => {
                self.click(&selectors.catalog_button).await?;
                self.click(&selectors.first_chapter_item).await?;
            }
            NavigationAction::NextPage | NavigationAction::NextChapter => {
                self.click(&selectors.footer).await?;
            }
        }
        self.settle().await;
        Ok(())
    }

    async fn await_manual_authorization(
        &mut self,
        prompt_dir: &Path,
        timeout: Duration,
    ) -> Result<()> {
        let home = self.settings.home_url.clone();
        self.navigate(&home).await?;
        self.click(&self.settings.selectors.login_button).await?;
        self.settle().await;

        tokio::fs::create_dir_all(prompt_dir).await?;
        let prompt_path = prompt_dir.join(LOGIN_PROMPT_FILE);
        let dialog = self.find(&self.settings.selectors.login_dialog).await?;
        let png = dialog
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|err| bridge_err("failed to capture login prompt", err))?;
        tokio::fs::write(&prompt_path, png).await?;
        info!("Login code written to {}", prompt_path.display());

        let deadline = Instant::now() + timeout;
        while self.login_page_pending().await? {
            if Instant::now() >= deadline {
                return Err(FolioscanError::AuthorizationTimeout { waited: timeout });
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        info!("Login completed");
        Ok(())
    }
}

#[async_trait]
impl PageSignalReader for ChromiumReader {
    async fn document_title(&mut self) -> Result<String> {
        self.text_of(&self.settings.selectors.document_title).await
    }

    async fn current_chapter_label(&mut self) -> Result<String> {
        self.text_of(&self.settings.selectors.chapter_title).await
    }

    async fn current_navigation_signal(&mut self) -> Result<Option<String>> {
        let selectors = &self.settings.selectors;
        let Some(footer) = self.find_optional(&selectors.footer).await? else {
            return Ok(None);
        };

        let class = footer
            .attribute("class")
            .await
            .map_err(|err| bridge_err("failed to read footer class", err))?
            .unwrap_or_default();
        if class.contains(&selectors.ending_class) {
            return Ok(Some(NavigationSignal::End.to_string()));
        }

        let text = footer
            .inner_text()
            .await
            .map_err(|err| bridge_err("failed to read footer text", err))?
            .unwrap_or_default();
        let text = text.trim();

        Ok(Some(classify_footer_text(
            text,
            &selectors.next_page_text,
            &selectors.next_chapter_text,
        )))
    }

    async fn assets_fully_loaded(&mut self) -> Result<bool> {
        let selector = js_string(&self.settings.selectors.content_images);
        self.eval(format!(
            "Array.from(document.querySelectorAll({selector})).every(img => img.complete)"
        ))
        .await
    }
}

/// Map the footer button caption to a canonical signal; unknown captions
/// are passed through untouched for the engine to reject.
fn classify_footer_text(text: &str, next_page: &str, next_chapter: &str) -> String {
    if text == next_page {
        NavigationSignal::SameChapter.to_string()
    } else if text == next_chapter {
        NavigationSignal::NextChapter.to_string()
    } else {
        text.to_owned()
    }
}

fn browser_config(settings: &BrowserSettings) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .window_size(settings.window_width, settings.window_height)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-blink-features=AutomationControlled",
        ]);

    builder = if settings.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(executable) = &settings.chrome_executable {
        builder = builder.chrome_executable(executable);
    }

    builder
        .build()
        .map_err(|err| FolioscanError::Bridge(format!("invalid browser configuration: {err}")))
}

async fn click_element(element: &Element, selector: &str) -> Result<()> {
    element
        .call_js_fn("function() { this.click(); }", false)
        .await
        .map_err(|err| bridge_err(format!("failed to click {selector:?}"), err))?;
    Ok(())
}

/// Quote `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        warn!(error = %err, "Falling back to empty selector");
        "\"\"".to_owned()
    })
}

fn bridge_err(context: impl std::fmt::Display, err: impl std::fmt::Display) -> FolioscanError {
    FolioscanError::Bridge(format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_captions_map_to_signals() {
        assert_eq!(classify_footer_text("下一页", "下一页", "下一章"), "SAME_CHAPTER");
        assert_eq!(classify_footer_text("下一章", "下一页", "下一章"), "NEXT_CHAPTER");
        assert_eq!(classify_footer_text("返回", "下一页", "下一章"), "返回");
    }

    #[test]
    fn selectors_are_quoted_for_javascript() {
        assert_eq!(js_string("img.wr_absolute"), "\"img.wr_absolute\"");
        assert_eq!(js_string("a[href=\"x\"]"), "\"a[href=\\\"x\\\"]\"");
    }
}
