use crate::config::MatchStrictness;
use crate::language::{split_tokens, token_matches};
use crate::models::StationRecord;

/// Quota fractions for a country's official languages, primary first.
/// Multi-language countries keep a dominant primary share with a fixed
/// minority slice per secondary language; past four languages the 30%
/// minority share is split evenly. Always sums to 1.0.
pub fn language_weights(k: usize) -> Vec<f64> {
    match k {
        0 => Vec::new(),
        1 => vec![1.0],
        2 => vec![0.9, 0.1],
        3 => vec![0.8, 0.1, 0.1],
        4 => vec![0.7, 0.1, 0.1, 0.1],
        k => {
            let minority = 0.3 / (k - 1) as f64;
            let mut weights = Vec::with_capacity(k);
            weights.push(0.7);
            weights.resize(k, minority);
            weights
        }
    }
}

/// Per-country "local genre" tag hints. Stations carrying one of these tags
/// are sorted to the front of their language bucket, so the sample leans
/// toward recognizably local programming.
pub const GENRE_PRIORITIES: &[(&str, &[&str])] = &[
    ("DE", &["schlager", "volksmusik"]),
    ("AT", &["schlager", "volksmusik"]),
    ("BR", &["sertanejo", "samba", "mpb", "forró"]),
    ("US", &["country", "bluegrass"]),
    ("FR", &["chanson"]),
    ("IN", &["bollywood", "desi"]),
    ("JP", &["j-pop", "enka"]),
    ("KR", &["k-pop", "trot"]),
    ("MX", &["ranchera", "banda", "mariachi"]),
    ("TR", &["türkü", "arabesk"]),
    ("GR", &["laiko", "rebetiko"]),
    ("PT", &["fado"]),
    ("ES", &["flamenco"]),
    ("AR", &["tango", "cumbia"]),
    ("CO", &["vallenato", "cumbia"]),
    ("JM", &["reggae", "dancehall"]),
    ("NG", &["afrobeats"]),
];

fn has_local_genre(cc: &str, record: &StationRecord) -> bool {
    let Some((_, hints)) = GENRE_PRIORITIES.iter().find(|(code, _)| *code == cc) else {
        return false;
    };
    let tags = record.tags.to_lowercase();
    hints.iter().any(|hint| tags.contains(hint))
}

/// Index of the first official language any of the station's language
/// tokens matches, in profile order. A candidate joins at most one bucket.
pub(crate) fn match_official(
    record: &StationRecord,
    officials: &[String],
    strictness: MatchStrictness,
) -> Option<usize> {
    let tokens = split_tokens(&record.language);
    officials
        .iter()
        .position(|official| tokens.iter().any(|t| token_matches(t, official, strictness)))
}

/// Orders a country's candidates for the prober: language-weighted preferred
/// picks first, then every remaining candidate as overflow so verification
/// failures can fall through to alternates.
///
/// With no official-language profile the candidates pass through unweighted
/// in their original order.
pub fn sample(
    cc: &str,
    candidates: &[StationRecord],
    officials: Option<&[String]>,
    strictness: MatchStrictness,
    target: usize,
) -> Vec<StationRecord> {
    let Some(officials) = officials.filter(|o| !o.is_empty()) else {
        return candidates.to_vec();
    };

    // Bucket candidate indices by first-matching official language, local
    // genre hits sorted to the front (stable, so directory order survives
    // within each half).
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); officials.len()];
    for (idx, record) in candidates.iter().enumerate() {
        if let Some(bucket) = match_official(record, officials, strictness) {
            buckets[bucket].push(idx);
        }
    }
    for bucket in &mut buckets {
        bucket.sort_by_key(|&idx| !has_local_genre(cc, &candidates[idx]));
    }

    let weights = language_weights(officials.len());
    let mut selected: Vec<usize> = Vec::with_capacity(target);
    let mut taken: Vec<bool> = vec![false; candidates.len()];

    // Floor-rounded quota take per language, primary first.
    for (bucket, weight) in buckets.iter().zip(&weights) {
        let quota = (weight * target as f64).floor() as usize;
        for &idx in bucket.iter().take(quota) {
            selected.push(idx);
            taken[idx] = true;
        }
    }

    // Sparse minority buckets leave the quota short; backfill from the
    // primary bucket's unused entries.
    if selected.len() < target {
        for &idx in &buckets[0] {
            if selected.len() >= target {
                break;
            }
            if !taken[idx] {
                selected.push(idx);
                taken[idx] = true;
            }
        }
    }

    // Everything not selected rides along as overflow in original order;
    // the prober walks it when preferred picks fail verification.
    let overflow = (0..candidates.len()).filter(|&idx| !taken[idx]);
    selected
        .into_iter()
        .chain(overflow)
        .map(|idx| candidates[idx].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::split_tokens;

    fn station(name: &str, language: &str, tags: &str) -> StationRecord {
        serde_json::from_str(&format!(
            r#"{{"name":"{name}","url":"http://{name}/","language":"{language}","tags":"{tags}"}}"#
        ))
        .unwrap()
    }

    fn officials(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn weight_table_matches_the_fixed_policy() {
        assert_eq!(language_weights(1), vec![1.0]);
        assert_eq!(language_weights(2), vec![0.9, 0.1]);
        assert_eq!(language_weights(3), vec![0.8, 0.1, 0.1]);
        assert_eq!(language_weights(4), vec![0.7, 0.1, 0.1, 0.1]);
        let five = language_weights(5);
        assert_eq!(five[0], 0.7);
        assert!(five[1..].iter().all(|&w| (w - 0.075).abs() < 1e-9));
    }

    #[test]
    fn weights_sum_to_one() {
        for k in 1..=9 {
            let sum: f64 = language_weights(k).iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "k={k} summed to {sum}");
        }
    }

    #[test]
    fn canada_gets_a_ninety_ten_split() {
        let mut candidates = Vec::new();
        for i in 0..40 {
            candidates.push(station(&format!("en{i}"), "english", ""));
        }
        for i in 0..10 {
            candidates.push(station(&format!("fr{i}"), "french", ""));
        }
        let ordered = sample(
            "CA",
            &candidates,
            Some(&officials(&["english", "french"])),
            MatchStrictness::Substring,
            25,
        );
        let preferred = &ordered[..25];
        let english = preferred.iter().filter(|s| s.language == "english").count();
        let french = preferred.iter().filter(|s| s.language == "french").count();
        // floor(0.9*25)=22 + floor(0.1*25)=2, backfilled to 25 from english.
        assert_eq!(english, 23);
        assert_eq!(french, 2);
        // Overflow keeps every remaining candidate available.
        assert_eq!(ordered.len(), candidates.len());
    }

    #[test]
    fn bucketed_stations_always_substring_overlap_their_language() {
        let officials = officials(&["norwegian", "sami"]);
        let candidates = vec![
            station("a", "Norwegian Bokmål", ""),
            station("b", "norsk", ""),
            station("c", "spanish", ""),
            station("d", "sami, english", ""),
        ];
        for record in &candidates {
            if let Some(i) = match_official(record, &officials, MatchStrictness::Substring) {
                let official = &officials[i];
                let overlap = split_tokens(&record.language)
                    .iter()
                    .any(|t| t.contains(official.as_str()) || official.contains(t.as_str()));
                assert!(overlap, "{} bucketed without overlap", record.name);
            }
        }
        assert!(match_official(&candidates[2], &officials, MatchStrictness::Substring).is_none());
    }

    #[test]
    fn first_matching_official_wins() {
        let officials = officials(&["english", "french"]);
        let record = station("a", "french, english", "");
        // "english" is first in profile order and a token matches it.
        assert_eq!(
            match_official(&record, &officials, MatchStrictness::Substring),
            Some(0)
        );
    }

    #[test]
    fn local_genre_tags_sort_to_the_front() {
        let candidates = vec![
            station("pop1", "german", "pop"),
            station("pop2", "german", "top 40"),
            station("schlager1", "german", "schlager,oldies"),
        ];
        let ordered = sample(
            "DE",
            &candidates,
            Some(&officials(&["german"])),
            MatchStrictness::Substring,
            2,
        );
        assert_eq!(ordered[0].name, "schlager1");
        // Stable sort keeps directory order among non-genre stations.
        assert_eq!(ordered[1].name, "pop1");
        assert_eq!(ordered.len(), 3);
    }

    #[test]
    fn no_profile_passes_candidates_through() {
        let candidates = vec![
            station("a", "whatever", ""),
            station("b", "", ""),
            station("c", "klingon", ""),
        ];
        let ordered = sample("XK", &candidates, None, MatchStrictness::Substring, 25);
        assert_eq!(ordered, candidates);
    }

    #[test]
    fn sparse_minority_bucket_backfills_from_primary() {
        let mut candidates = Vec::new();
        for i in 0..30 {
            candidates.push(station(&format!("en{i}"), "english", ""));
        }
        // No french candidates at all.
        let ordered = sample(
            "CA",
            &candidates,
            Some(&officials(&["english", "french"])),
            MatchStrictness::Substring,
            25,
        );
        assert_eq!(ordered.len(), 30);
        assert!(ordered[..25].iter().all(|s| s.language == "english"));
    }

    #[test]
    fn every_candidate_appears_exactly_once() {
        let candidates = vec![
            station("a", "english", ""),
            station("b", "french", ""),
            station("c", "english", ""),
            station("d", "klingon", ""),
        ];
        let ordered = sample(
            "CA",
            &candidates,
            Some(&officials(&["english", "french"])),
            MatchStrictness::Substring,
            2,
        );
        assert_eq!(ordered.len(), candidates.len());
        for record in &candidates {
            assert_eq!(ordered.iter().filter(|s| s.name == record.name).count(), 1);
        }
    }
}
