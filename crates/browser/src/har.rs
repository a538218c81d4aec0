//! Minimal HAR (HTTP Archive) capture over CDP network events.
//!
//! Subscribes to `Network.requestWillBeSent`/`responseReceived`, accumulates
//! entries, and serializes a HAR 1.2 document. The result is returned as
//! `base64(zlib(body))`, the wire encoding for every binary artifact (§6).

use std::sync::Arc;

use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::listeners::EventStream;
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;

use authscope_domain::error::{Error, Result};

use crate::driver::{zlib_base64, BrowserContext};

#[derive(Debug, Clone, Serialize)]
struct HarEntry {
    #[serde(rename = "startedDateTime")]
    started_date_time: String,
    request: HarRequest,
    response: HarResponse,
}

#[derive(Debug, Clone, Serialize)]
struct HarRequest {
    method: String,
    url: String,
}

#[derive(Debug, Clone, Serialize)]
struct HarResponse {
    status: i64,
    #[serde(rename = "mimeType")]
    mime_type: String,
}

#[derive(Default)]
struct HarState {
    entries: Vec<HarEntry>,
    pending_method: std::collections::HashMap<String, (String, String)>,
    /// Every request URL seen, in request order — populated even for
    /// requests whose response never arrives within the capture window.
    requested_urls: Vec<String>,
}

/// A handle that accumulates HAR entries for the lifetime of a page
/// navigation. Call [`HarRecorder::finish`] to drain the buffer into an
/// encoded artifact.
pub struct HarRecorder {
    state: Arc<Mutex<HarState>>,
}

impl HarRecorder {
    /// Attach to a page's network event stream. Must be called before
    /// navigation so the first request is captured.
    pub async fn attach(ctx: &BrowserContext) -> Result<Self> {
        let state = Arc::new(Mutex::new(HarState::default()));

        let mut req_stream: EventStream<EventRequestWillBeSent> = ctx
            .page
            .event_listener()
            .await
            .map_err(|e| Error::Browser(format!("network listener failed: {e}")))?;
        let req_state = state.clone();
        tokio::spawn(async move {
            while let Some(ev) = req_stream.next().await {
                let mut s = req_state.lock();
                s.requested_urls.push(ev.request.url.clone());
                s.pending_method.insert(
                    ev.request_id.inner().to_string(),
                    (ev.request.method.clone(), ev.request.url.clone()),
                );
            }
        });

        let mut resp_stream: EventStream<EventResponseReceived> = ctx
            .page
            .event_listener()
            .await
            .map_err(|e| Error::Browser(format!("network listener failed: {e}")))?;
        let resp_state = state.clone();
        tokio::spawn(async move {
            while let Some(ev) = resp_stream.next().await {
                let mut s = resp_state.lock();
                let (method, url) = s
                    .pending_method
                    .remove(ev.request_id.inner())
                    .unwrap_or_else(|| ("GET".into(), ev.response.url.clone()));
                s.entries.push(HarEntry {
                    started_date_time: chrono::Utc::now().to_rfc3339(),
                    request: HarRequest { method, url },
                    response: HarResponse {
                        status: ev.response.status,
                        mime_type: ev.response.mime_type.clone(),
                    },
                });
            }
        });

        Ok(Self { state })
    }

    /// URLs of every request observed so far, in request order. Used by the
    /// IdP click-and-observe interceptor to match a `login_request_rule`
    /// without waiting for the full HAR artifact.
    pub fn request_urls(&self) -> Vec<String> {
        self.state.lock().requested_urls.clone()
    }

    /// Drain captured entries into a HAR document and return the wire-ready
    /// `base64(zlib(body))` encoding.
    pub fn finish(&self) -> String {
        let entries = self.state.lock().entries.clone();
        let har = serde_json::json!({
            "log": {
                "version": "1.2",
                "creator": { "name": "authscope", "version": "1" },
                "entries": entries,
            }
        });
        let body = serde_json::to_vec(&har).unwrap_or_default();
        zlib_base64(&body)
    }
}
