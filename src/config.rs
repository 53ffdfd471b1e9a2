use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "stationgen.toml";

/// How a normalized station-language token is matched against a country's
/// official languages. `Substring` (the default) accepts containment in
/// either direction so "norwegian bokmål" matches "norwegian"; `Exact`
/// requires the token to equal the official name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrictness {
    #[default]
    Substring,
    Exact,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory mirrors, tried in order until one yields a catalog.
    pub mirrors: Vec<String>,
    /// Result-size parameter for the catalog query.
    pub catalog_limit: u32,
    /// Ask the directory to pre-filter stations it already knows are broken.
    pub hide_broken: bool,
    /// Per-country cap on emitted stations.
    pub stations_per_country: usize,
    /// Countries with fewer language-matched candidates than this are
    /// omitted entirely.
    pub min_candidates: usize,
    /// Per-request timeout for liveness probes, in seconds.
    pub probe_timeout_secs: u64,
    pub strictness: MatchStrictness,
    pub countries_url: String,
    pub languages_url: String,
    pub atlas_url: String,
    pub output_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mirrors: vec![
                "https://de1.api.radio-browser.info/json".to_string(),
                "https://at1.api.radio-browser.info/json".to_string(),
                "https://nl1.api.radio-browser.info/json".to_string(),
            ],
            catalog_limit: 500_000,
            hide_broken: true,
            stations_per_country: 25,
            min_candidates: 3,
            probe_timeout_secs: 5,
            strictness: MatchStrictness::default(),
            countries_url: "https://cdn.jsdelivr.net/npm/countries-list@3/dist/countries.min.json"
                .to_string(),
            languages_url: "https://cdn.jsdelivr.net/npm/countries-list@3/dist/languages.min.json"
                .to_string(),
            atlas_url: "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json".to_string(),
            output_path: "stations.json".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Loads `stationgen.toml` from the working directory; a missing file is
    /// not an error, the defaults cover a full run.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("Failed to read config: {path:?}")),
        };
        let text = String::from_utf8_lossy(&bytes);
        toml::from_str(&text).with_context(|| format!("Invalid config TOML: {path:?}"))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
