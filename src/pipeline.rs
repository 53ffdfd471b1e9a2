use crate::config::PipelineConfig;
use crate::grouping::UNKNOWN;
use crate::language::station_matches;
use crate::models::{StationRecord, StationSummary};
use crate::prober::StationProber;
use crate::reference::ReferenceData;
use crate::sampler::sample;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

pub type OutputDataset = BTreeMap<String, Vec<StationSummary>>;

/// Walks every grouped country sequentially: language-filter, apply the
/// minimum-candidate floor, order candidates through the sampler, then probe
/// them one at a time until the per-country cap is reached or candidates run
/// out. Countries that end up empty are omitted, never errors.
pub async fn run<P: StationProber>(
    grouped: &HashMap<String, Vec<StationRecord>>,
    reference: &ReferenceData,
    cfg: &PipelineConfig,
    scope: Option<&str>,
    prober: &P,
) -> OutputDataset {
    let mut dataset = OutputDataset::new();

    // Sorted iteration keeps runs deterministic for identical inputs.
    let mut codes: Vec<&String> = grouped.keys().collect();
    codes.sort();

    for cc in codes {
        let cc = cc.as_str();
        if cc == UNKNOWN {
            continue;
        }
        if let Some(scope) = scope {
            if cc != scope {
                continue;
            }
        }

        let stations = &grouped[cc];
        let officials = reference.official_languages(cc);

        // Countries with a profile only keep language-matched candidates;
        // without one, everything stays eligible.
        let candidates: Vec<StationRecord> = match officials {
            Some(officials) => stations
                .iter()
                .filter(|s| station_matches(&s.language, officials, cfg.strictness))
                .cloned()
                .collect(),
            None => stations.clone(),
        };

        if candidates.len() < cfg.min_candidates {
            debug!(
                country = %cc,
                candidates = candidates.len(),
                floor = cfg.min_candidates,
                "below candidate floor, omitting country"
            );
            continue;
        }

        let display_name = reference.display_name(cc).unwrap_or(cc).to_string();
        let ordered = sample(cc, &candidates, officials, cfg.strictness, cfg.stations_per_country);
        info!(
            country = %cc,
            candidates = ordered.len(),
            "probing candidates"
        );

        let mut verified: Vec<StationSummary> = Vec::new();
        for candidate in &ordered {
            if verified.len() >= cfg.stations_per_country {
                break;
            }
            if prober.verify(candidate).await {
                debug!(country = %cc, station = %candidate.name, "station verified");
                verified.push(StationSummary::from_record(candidate, &display_name, cc));
            }
        }

        if verified.is_empty() {
            info!(country = %cc, "no candidate survived verification, omitting country");
            continue;
        }

        info!(country = %cc, verified = verified.len(), "country complete");
        dataset.insert(display_name, verified);
    }

    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::grouping::{group_by_country, rescue_unknown};
    use crate::prober::StationProber;
    use crate::reference::ReferenceData;
    use std::collections::HashSet;

    const COUNTRIES: &str = r#"{
        "US": {"name": "United States", "languages": ["en"]},
        "CA": {"name": "Canada", "languages": ["en", "fr"]},
        "RU": {"name": "Russia", "languages": ["ru"]}
    }"#;
    const LANGUAGES: &str = r#"{
        "en": {"name": "English"},
        "fr": {"name": "French"},
        "ru": {"name": "Russian"}
    }"#;
    const ATLAS: &str = r#"{"type":"Topology","objects":{"countries":{"geometries":[
        {"type":"Polygon","id":"840","properties":{"name":"United States"}},
        {"type":"Polygon","id":"124","properties":{"name":"Canada"}},
        {"type":"Polygon","id":"643","properties":{"name":"Russia"}}
    ]}}}"#;

    fn reference() -> ReferenceData {
        ReferenceData::build(COUNTRIES.as_bytes(), LANGUAGES.as_bytes(), ATLAS.as_bytes()).unwrap()
    }

    fn station(name: &str, country: &str, cc: &str, language: &str) -> StationRecord {
        serde_json::from_str(&format!(
            r#"{{"name":"{name}","url":"http://{name}.example/s","country":"{country}","countrycode":"{cc}","language":"{language}"}}"#
        ))
        .unwrap()
    }

    /// Canned prober: rejects stations whose name is listed, accepts the
    /// rest. Never touches the network.
    struct StubProber {
        reject: HashSet<String>,
    }

    impl StubProber {
        fn accept_all() -> Self {
            Self {
                reject: HashSet::new(),
            }
        }

        fn rejecting(names: &[&str]) -> Self {
            Self {
                reject: names.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl StationProber for StubProber {
        async fn verify(&self, station: &StationRecord) -> bool {
            !self.reject.contains(&station.name)
        }
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            stations_per_country: 3,
            min_candidates: 3,
            ..PipelineConfig::default()
        }
    }

    fn us_stations(n: usize) -> Vec<StationRecord> {
        (0..n)
            .map(|i| station(&format!("us{i}"), "United States", "US", "english"))
            .collect()
    }

    #[tokio::test]
    async fn caps_each_country_and_keeps_order() {
        let grouped = group_by_country(us_stations(10));
        let dataset = run(
            &grouped,
            &reference(),
            &test_config(),
            None,
            &StubProber::accept_all(),
        )
        .await;
        let us = &dataset["United States"];
        assert_eq!(us.len(), 3);
        assert_eq!(us[0].name, "us0");
        assert_eq!(us[0].country, "United States");
        assert_eq!(us[0].countrycode, "US");
    }

    #[tokio::test]
    async fn rejected_candidate_is_replaced_by_the_next_in_order() {
        let grouped = group_by_country(us_stations(5));
        let dataset = run(
            &grouped,
            &reference(),
            &test_config(),
            None,
            &StubProber::rejecting(&["us0", "us2"]),
        )
        .await;
        let names: Vec<&str> = dataset["United States"].iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["us1", "us3", "us4"]);
    }

    #[tokio::test]
    async fn below_floor_countries_are_omitted() {
        let mut stations = us_stations(5);
        stations.push(station("ca0", "Canada", "CA", "english"));
        stations.push(station("ca1", "Canada", "CA", "french"));
        let grouped = group_by_country(stations);
        let dataset = run(
            &grouped,
            &reference(),
            &test_config(),
            None,
            &StubProber::accept_all(),
        )
        .await;
        assert!(dataset.contains_key("United States"));
        assert!(!dataset.contains_key("Canada"));
    }

    #[tokio::test]
    async fn language_mismatches_do_not_count_toward_the_floor() {
        // Three stations but only two in an official language.
        let stations = vec![
            station("ca0", "Canada", "CA", "english"),
            station("ca1", "Canada", "CA", "french"),
            station("ca2", "Canada", "CA", "klingon"),
        ];
        let grouped = group_by_country(stations);
        let dataset = run(
            &grouped,
            &reference(),
            &test_config(),
            None,
            &StubProber::accept_all(),
        )
        .await;
        assert!(dataset.is_empty());
    }

    #[tokio::test]
    async fn zero_verified_countries_are_omitted() {
        let grouped = group_by_country(us_stations(4));
        let dataset = run(
            &grouped,
            &reference(),
            &test_config(),
            None,
            &StubProber::rejecting(&["us0", "us1", "us2", "us3"]),
        )
        .await;
        assert!(dataset.is_empty());
    }

    #[tokio::test]
    async fn scope_limits_the_run_to_one_country() {
        let mut stations = us_stations(4);
        for i in 0..4 {
            stations.push(station(&format!("ru{i}"), "Russia", "RU", "russian"));
        }
        let grouped = group_by_country(stations);
        let dataset = run(
            &grouped,
            &reference(),
            &test_config(),
            Some("RU"),
            &StubProber::accept_all(),
        )
        .await;
        assert_eq!(dataset.len(), 1);
        assert!(dataset.contains_key("Russia"));
    }

    #[tokio::test]
    async fn rescued_unknown_stations_flow_into_their_country() {
        let mut stations = vec![
            station("r0", "Russia", "", "russian"),
            station("r1", "Russia", "", "russian"),
            station("r2", "Russian Federation", "", "russian"),
            station("lost", "Atlantis", "", "atlantean"),
        ];
        stations.push(station("r3", "Russia", "RU", "russian"));
        let mut grouped = group_by_country(stations);
        rescue_unknown(&mut grouped);
        let dataset = run(
            &grouped,
            &reference(),
            &test_config(),
            None,
            &StubProber::accept_all(),
        )
        .await;
        let ru = &dataset["Russia"];
        assert_eq!(ru.len(), 3);
        // The unrescued record never surfaces anywhere.
        assert!(dataset.values().flatten().all(|s| s.name != "lost"));
    }

    #[tokio::test]
    async fn frozen_inputs_yield_identical_serializations() {
        let mut stations = us_stations(6);
        for i in 0..5 {
            stations.push(station(&format!("ru{i}"), "Russia", "RU", "russian"));
        }
        let grouped = group_by_country(stations);
        let reference = reference();
        let cfg = test_config();
        let prober = StubProber::rejecting(&["us1", "ru0"]);

        let first = run(&grouped, &reference, &cfg, None, &prober).await;
        let second = run(&grouped, &reference, &cfg, None, &prober).await;
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
