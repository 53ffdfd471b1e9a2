use crate::models::StationRecord;
use std::collections::HashMap;
use tracing::info;

pub const UNKNOWN: &str = "UNKNOWN";

/// Free-text country hints used by the rescue pass: a station stuck in the
/// `UNKNOWN` bucket whose country field contains the hint (case-insensitive)
/// is moved to the paired code. Deliberately small and obvious; this is not
/// a geocoder.
pub const RESCUE_HINTS: &[(&str, &str)] = &[
    ("russia", "RU"),
    ("united states", "US"),
    ("poland", "PL"),
    ("germany", "DE"),
    ("united kingdom", "GB"),
    ("france", "FR"),
    ("brazil", "BR"),
    ("india", "IN"),
    ("spain", "ES"),
    ("italy", "IT"),
    ("mexico", "MX"),
    ("canada", "CA"),
    ("australia", "AU"),
    ("netherlands", "NL"),
    ("ukraine", "UA"),
    ("turkey", "TR"),
    ("greece", "GR"),
    ("japan", "JP"),
];

/// Buckets the raw catalog by uppercased alpha-2 code. Absent or blank codes
/// land in `UNKNOWN`; nothing is rejected at this stage.
pub fn group_by_country(stations: Vec<StationRecord>) -> HashMap<String, Vec<StationRecord>> {
    let mut grouped: HashMap<String, Vec<StationRecord>> = HashMap::new();
    for station in stations {
        let cc = station.countrycode.trim().to_uppercase();
        let key = if cc.is_empty() { UNKNOWN.to_string() } else { cc };
        grouped.entry(key).or_default().push(station);
    }
    grouped
}

/// Rescue pass over the `UNKNOWN` bucket: reassign records whose free-text
/// country field matches a hint. Unmatched records stay in `UNKNOWN` and are
/// never emitted.
pub fn rescue_unknown(grouped: &mut HashMap<String, Vec<StationRecord>>) -> usize {
    let unknown = match grouped.remove(UNKNOWN) {
        Some(list) => list,
        None => return 0,
    };

    let mut rescued = 0usize;
    let mut remain = Vec::new();
    for station in unknown {
        let country = station.country.to_lowercase();
        match RESCUE_HINTS
            .iter()
            .find(|(hint, _)| country.contains(hint))
        {
            Some((_, cc)) => {
                grouped.entry((*cc).to_string()).or_default().push(station);
                rescued += 1;
            }
            None => remain.push(station),
        }
    }

    info!(rescued, remaining_unknown = remain.len(), "rescue pass over UNKNOWN bucket");
    grouped.insert(UNKNOWN.to_string(), remain);
    rescued
}
