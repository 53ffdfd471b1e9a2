use serde::{Deserialize, Serialize};

/// One raw record as returned by the radio directory. Fields are noisy and
/// frequently blank; everything is defaulted so a single sparse record never
/// sinks the whole catalog parse.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub url_resolved: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub countrycode: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub bitrate: Option<u32>,
}

impl StationRecord {
    /// The URL the client should stream from. The directory's resolved URL
    /// (playlists unwrapped, redirects followed) is preferred; some records
    /// only carry the registered URL.
    pub fn stream_url(&self) -> &str {
        if self.url_resolved.trim().is_empty() {
            &self.url
        } else {
            &self.url_resolved
        }
    }
}

/// The reduced station shape written to the output artifact. `country` holds
/// the canonical display name, not the free-text field from the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub name: String,
    pub url: String,
    pub country: String,
    pub countrycode: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    pub bitrate: Option<u32>,
}

impl StationSummary {
    pub fn from_record(record: &StationRecord, display_name: &str, countrycode: &str) -> Self {
        let tags = record.tags.trim();
        Self {
            name: record.name.clone(),
            url: record.stream_url().to_string(),
            country: display_name.to_string(),
            countrycode: countrycode.to_string(),
            language: record.language.clone(),
            tags: if tags.is_empty() {
                None
            } else {
                Some(tags.to_string())
            },
            bitrate: record.bitrate,
        }
    }
}
