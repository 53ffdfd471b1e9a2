use crate::config::PipelineConfig;
use crate::models::StationRecord;
use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// The full catalog for a popular mirror runs to a few hundred MB of JSON.
const MAX_CATALOG_BYTES: usize = 512 * 1024 * 1024;

pub fn build_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static("stationgen/0.1 (station dataset curation)"),
    );
    reqwest::ClientBuilder::new()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(5))
        // The full catalog is hundreds of MB; give the body read real time.
        .timeout(Duration::from_secs(300))
        .build()
        .context("Failed to build HTTP client")
}

/// Reads a response body with a hard size cap, so a misbehaving upstream can
/// fail the request instead of exhausting memory.
pub async fn read_limited(resp: reqwest::Response, limit: usize) -> Result<Vec<u8>> {
    if let Some(len) = resp.content_length() {
        if len as usize > limit {
            return Err(anyhow!("HTTP response too large ({len} bytes)"));
        }
    }

    let mut data: Vec<u8> = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("HTTP body read error")?;
        if data.len().saturating_add(chunk.len()) > limit {
            return Err(anyhow!("HTTP response exceeded size limit"));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// Fetches the raw station catalog, walking the configured mirrors in order.
/// Any network error or malformed body moves on to the next mirror; only
/// total exhaustion fails the run.
pub struct DirectoryClient {
    http: reqwest::Client,
    mirrors: Vec<String>,
    catalog_limit: u32,
    hide_broken: bool,
}

impl DirectoryClient {
    pub fn new(http: reqwest::Client, cfg: &PipelineConfig) -> Self {
        Self {
            http,
            mirrors: cfg.mirrors.clone(),
            catalog_limit: cfg.catalog_limit,
            hide_broken: cfg.hide_broken,
        }
    }

    pub async fn fetch_all_stations(&self) -> Result<Vec<StationRecord>> {
        let mut last_err: Option<anyhow::Error> = None;
        for base in &self.mirrors {
            let url = match self.search_url(base) {
                Ok(u) => u,
                Err(e) => {
                    warn!(mirror = %base, error = %e, "skipping malformed mirror base URL");
                    last_err = Some(e);
                    continue;
                }
            };

            info!(mirror = %base, "fetching station catalog");
            match self.fetch_from(url).await {
                Ok(stations) => {
                    info!(mirror = %base, count = stations.len(), "catalog fetched");
                    return Ok(stations);
                }
                Err(e) => {
                    warn!(mirror = %base, error = %e, "mirror failed, trying next");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| anyhow!("no directory mirrors configured"))
            .context("All directory mirrors exhausted"))
    }

    fn search_url(&self, base: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/stations/search", base.trim_end_matches('/')))
            .context("Invalid directory mirror URL")?;
        url.query_pairs_mut()
            .append_pair("limit", &self.catalog_limit.to_string())
            .append_pair("hidebroken", if self.hide_broken { "true" } else { "false" });
        Ok(url)
    }

    async fn fetch_from(&self, url: Url) -> Result<Vec<StationRecord>> {
        let resp = self.http.get(url).send().await.context("Catalog request failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("Catalog request returned {}", resp.status()));
        }
        let bytes = read_limited(resp, MAX_CATALOG_BYTES).await?;
        serde_json::from_slice(&bytes).context("Invalid station catalog response")
    }
}

/// Accepts only http/https stream URLs; the catalog occasionally carries
/// mms:// and file-scheme junk.
pub fn parse_stream_url(s: &str) -> Result<Url> {
    let url = Url::parse(s.trim()).context("Invalid stream URL")?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!("Unsupported stream URL scheme: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[test]
    fn builds_search_url_with_limit_and_hidebroken() {
        let cfg = PipelineConfig {
            mirrors: vec!["https://de1.api.radio-browser.info/json/".to_string()],
            catalog_limit: 1000,
            hide_broken: true,
            ..PipelineConfig::default()
        };
        let client = DirectoryClient::new(reqwest::Client::new(), &cfg);
        let url = client.search_url(&cfg.mirrors[0]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://de1.api.radio-browser.info/json/stations/search?limit=1000&hidebroken=true"
        );
    }

    #[test]
    fn parses_catalog_records() {
        let body = r#"[{"name":"Test FM","url":"http://t/","url_resolved":"http://t/mp3","countrycode":"US","language":"english","bitrate":128}]"#;
        let stations: Vec<StationRecord> = serde_json::from_slice(body.as_bytes()).unwrap();
        assert_eq!(stations[0].name, "Test FM");
        assert_eq!(stations[0].bitrate, Some(128));
    }

    #[test]
    fn validates_stream_url_schemes() {
        assert!(parse_stream_url("https://example.com/stream").is_ok());
        assert!(parse_stream_url("http://example.com/stream").is_ok());
        assert!(parse_stream_url("mms://example.com/stream").is_err());
        assert!(parse_stream_url("file:///etc/passwd").is_err());
    }
}
