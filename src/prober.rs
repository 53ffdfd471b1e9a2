use crate::directory::parse_stream_url;
use crate::models::StationRecord;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, USER_AGENT};
use reqwest::Method;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Synthetic origin attached to probes so upstream CORS handling behaves as
/// it would for the real game client.
const PROBE_ORIGIN: &str = "https://radio.example.com";

/// Verification seam between the pipeline and the network; tests substitute
/// a canned implementation.
pub trait StationProber {
    async fn verify(&self, station: &StationRecord) -> bool;
}

/// One probe attempt walks these states in order. The lightweight check is a
/// HEAD; some stream servers reject HEAD but serve GET, so a full request
/// gets a second chance before rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeState {
    Pending,
    LightweightTried,
    FullTried,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    BadUrl,
    RequestFailed,
    BadStatus(u16),
    MissingCors,
    NotAudio,
    Unreachable,
}

pub struct HttpProber {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("stationgen/0.1 (station dataset curation)"),
        );
        headers.insert(ORIGIN, HeaderValue::from_static(PROBE_ORIGIN));
        let http = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .connect_timeout(timeout)
            .build()
            .context("Failed to build probe HTTP client")?;
        Ok(Self { http, timeout })
    }

    /// Browser-simulation probe: status < 400, permissive CORS, audio
    /// content type.
    async fn probe(&self, raw_url: &str) -> Result<(), RejectReason> {
        let url = match parse_stream_url(raw_url) {
            Ok(u) => u,
            Err(_) => return Err(RejectReason::BadUrl),
        };
        let url = upgrade_to_https(url);
        run_probe(|method| self.attempt(method, url.clone())).await
    }

    async fn attempt(&self, method: Method, url: Url) -> Result<(), RejectReason> {
        let resp = self
            .http
            .request(method, url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|_| RejectReason::RequestFailed)?;
        let status = resp.status().as_u16();
        let allow_origin = header_str(resp.headers(), "access-control-allow-origin");
        let content_type = header_str(resp.headers(), "content-type");
        // Body is dropped unread; only the response head matters.
        evaluate(status, allow_origin.as_deref(), content_type.as_deref())
    }

    /// Plain reachability, no CORS or content-type requirement.
    async fn reachable(&self, raw_url: &str) -> bool {
        let Ok(url) = parse_stream_url(raw_url) else {
            return false;
        };
        let url = upgrade_to_https(url);
        match self.http.get(url).timeout(self.timeout).send().await {
            Ok(resp) => resp.status().as_u16() < 400,
            Err(_) => false,
        }
    }
}

impl StationProber for HttpProber {
    /// A station counts as verified only when it passes both the
    /// browser-simulation probe and the independent reachability check.
    async fn verify(&self, station: &StationRecord) -> bool {
        let url = station.stream_url();
        match self.probe(url).await {
            Ok(()) => {}
            Err(reason) => {
                debug!(station = %station.name, url, ?reason, "probe rejected");
                return false;
            }
        }
        if !self.reachable(url).await {
            debug!(station = %station.name, url, reason = ?RejectReason::Unreachable, "probe rejected");
            return false;
        }
        true
    }
}

/// Drives one probe through the attempt states: a rejected HEAD gets a GET
/// retry before the terminal verdict, and the reported reason is always the
/// last attempt's. Separated from the HTTP side so the transitions are
/// testable with a canned attempt function.
async fn run_probe<F, Fut>(mut attempt: F) -> Result<(), RejectReason>
where
    F: FnMut(Method) -> Fut,
    Fut: std::future::Future<Output = Result<(), RejectReason>>,
{
    let mut state = ProbeState::Pending;
    let mut last = RejectReason::RequestFailed;
    loop {
        state = match state {
            ProbeState::Pending => match attempt(Method::HEAD).await {
                Ok(()) => ProbeState::Verified,
                Err(reason) => {
                    last = reason;
                    ProbeState::LightweightTried
                }
            },
            ProbeState::LightweightTried => match attempt(Method::GET).await {
                Ok(()) => ProbeState::Verified,
                Err(reason) => {
                    last = reason;
                    ProbeState::FullTried
                }
            },
            ProbeState::FullTried => ProbeState::Rejected,
            ProbeState::Verified => return Ok(()),
            ProbeState::Rejected => return Err(last),
        };
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Mirrors the browser's mixed-content auto-upgrade: the client page is
/// served over https, so plain-http streams would be blocked anyway.
fn upgrade_to_https(mut url: Url) -> Url {
    if url.scheme() == "http" {
        let _ = url.set_scheme("https");
    }
    url
}

/// Acceptance rule shared by the lightweight and full attempts.
fn evaluate(
    status: u16,
    allow_origin: Option<&str>,
    content_type: Option<&str>,
) -> Result<(), RejectReason> {
    if status >= 400 {
        return Err(RejectReason::BadStatus(status));
    }
    match allow_origin {
        Some("*") => {}
        Some(origin) if origin == PROBE_ORIGIN => {}
        _ => return Err(RejectReason::MissingCors),
    }
    match content_type {
        Some(ct) if ct.trim_start().to_lowercase().starts_with("audio/") => Ok(()),
        _ => Err(RejectReason::NotAudio),
    }
}
