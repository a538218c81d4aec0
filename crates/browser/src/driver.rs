//! The browser driver (C1): launches isolated contexts, navigates, waits,
//! captures screenshots/HAR, and exposes the CDP operations the detectors
//! need (virtual authenticators, accessibility tree, box model).
//!
//! [`BrowserDriver`] is a trait, not a direct `chromiumoxide` call site, so
//! the lifecycle operations (open/navigate/reload) can be faked in tests.
//! `BrowserContext` itself still wraps a concrete `chromiumoxide::Page`,
//! since the per-detector probes need real CDP evaluation.

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::{Browser, BrowserConfig as CdpBrowserConfig, Page};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use futures_util::StreamExt;
use std::io::Write as _;
use std::time::Duration;

use authscope_domain::config::BrowserConfig;
use authscope_domain::error::{Error, Result};

use crate::failure::NavigationFailure;
use crate::webauthn::WEBAUTHN_INSTRUMENTATION_SCRIPT;

/// Why a loaded document cannot be analyzed further (§4.1 `contentAnalyzable`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotAnalyzableReason {
    AboutBlank,
    NonHtmlContentType(String),
}

/// A scoped browser context + page pair. Callers must call [`BrowserContext::close`]
/// on every exit path; `Drop` best-effort closes as a backstop.
pub struct BrowserContext {
    pub browser: Browser,
    pub page: Page,
}

impl BrowserContext {
    /// Graceful shutdown: closes the CDP connection and lets the spawned
    /// Chromium process exit. `chromiumoxide::Browser`'s own `Drop` kills
    /// the process as a backstop if a caller forgets this.
    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| Error::Browser(format!("browser close failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn open(&self, cfg: &BrowserConfig) -> Result<BrowserContext>;
    async fn navigate(&self, ctx: &BrowserContext, url: &str) -> std::result::Result<(), NavigationFailure>;
    async fn wait_for_load(&self, ctx: &BrowserContext, cfg: &BrowserConfig);
    async fn reload(&self, ctx: &BrowserContext) -> std::result::Result<(), NavigationFailure>;
    async fn set_about_blank(&self, ctx: &BrowserContext);
    async fn screenshot(&self, ctx: &BrowserContext) -> Result<String>;
    async fn content_analyzable(&self, ctx: &BrowserContext) -> (bool, Option<NotAnalyzableReason>);
}

/// `chromiumoxide`-backed implementation over CDP.
pub struct ChromiumDriver;

impl ChromiumDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChromiumDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn open(&self, cfg: &BrowserConfig) -> Result<BrowserContext> {
        let mut builder = CdpBrowserConfig::builder()
            .window_size(cfg.width, cfg.height)
            .viewport(None);
        if cfg.headless {
            builder = builder.with_head();
        }
        if let Some(ua) = &cfg.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let config = builder
            .build()
            .map_err(|e| Error::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Browser(format!("launch failed: {e}")))?;

        // The handler loop must be polled for the connection to make
        // progress; spawn it detached for the lifetime of the process.
        tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Browser(format!("new_page failed: {e}")))?;

        page.evaluate_on_new_document(WEBAUTHN_INSTRUMENTATION_SCRIPT)
            .await
            .map_err(|e| Error::Browser(format!("init script injection failed: {e}")))?;

        Ok(BrowserContext { browser, page })
    }

    async fn navigate(&self, ctx: &BrowserContext, url: &str) -> std::result::Result<(), NavigationFailure> {
        ctx.page.goto(url).await.map_err(|e| {
            let msg = e.to_string();
            let lower = msg.to_ascii_lowercase();
            NavigationFailure::classify(lower.contains("timed out"), lower.contains("connect"), &msg)
        })?;
        Ok(())
    }

    async fn wait_for_load(&self, ctx: &BrowserContext, cfg: &BrowserConfig) {
        tokio::time::sleep(Duration::from_millis(cfg.sleep_after_onload_ms)).await;
        if cfg.wait_for_networkidle {
            let _ = tokio::time::timeout(
                Duration::from_millis(cfg.timeout_networkidle_ms),
                ctx.page.wait_for_navigation(),
            )
            .await;
            tokio::time::sleep(Duration::from_millis(cfg.sleep_after_networkidle_ms)).await;
        }
    }

    async fn reload(&self, ctx: &BrowserContext) -> std::result::Result<(), NavigationFailure> {
        ctx.page
            .reload()
            .await
            .map(|_| ())
            .map_err(|e| NavigationFailure::Other { message: e.to_string() })
    }

    async fn set_about_blank(&self, ctx: &BrowserContext) {
        let _ = ctx.page.goto("about:blank").await;
    }

    async fn screenshot(&self, ctx: &BrowserContext) -> Result<String> {
        let png = ctx
            .page
            .screenshot(
                chromiumoxide::page::ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
            )
            .await
            .map_err(|e| Error::Browser(format!("screenshot failed: {e}")))?;
        Ok(zlib_base64(&png))
    }

    async fn content_analyzable(&self, ctx: &BrowserContext) -> (bool, Option<NotAnalyzableReason>) {
        let url = ctx.page.url().await.unwrap_or_default().unwrap_or_default();
        if url == "about:blank" {
            return (false, Some(NotAnalyzableReason::AboutBlank));
        }
        let content_type: String = ctx
            .page
            .evaluate("document.contentType")
            .await
            .ok()
            .and_then(|v| v.into_value().ok())
            .unwrap_or_default();
        if !content_type.is_empty() && !content_type.contains("html") {
            return (false, Some(NotAnalyzableReason::NonHtmlContentType(content_type)));
        }
        (true, None)
    }
}

/// `base64(zlib(bytes))`, the wire encoding for every binary artifact (§6).
pub fn zlib_base64(bytes: &[u8]) -> String {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let _ = encoder.write_all(bytes);
    let compressed = encoder.finish().unwrap_or_default();
    base64::engine::general_purpose::STANDARD.encode(compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zlib_base64_round_trips_via_flate2() {
        let data = b"hello world, this is test artifact data";
        let encoded = zlib_base64(data);
        let compressed = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .unwrap();
        let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut decoder, &mut out).unwrap();
        assert_eq!(out, data);
    }
}
