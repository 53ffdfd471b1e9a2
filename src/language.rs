use crate::config::MatchStrictness;

/// Free-text language variants seen in the wild mapped to the canonical
/// English name used for all matching. Keys are lowercase; canonical names
/// never appear as keys, which keeps `normalize` idempotent.
pub const ALIASES: &[(&str, &str)] = &[
    // Native-script / endonym forms
    ("deutsch", "german"),
    ("français", "french"),
    ("francais", "french"),
    ("español", "spanish"),
    ("espanol", "spanish"),
    ("castellano", "spanish"),
    ("castilian", "spanish"),
    ("português", "portuguese"),
    ("portugues", "portuguese"),
    ("italiano", "italian"),
    ("nederlands", "dutch"),
    ("vlaams", "dutch"),
    ("flemish", "dutch"),
    ("polski", "polish"),
    ("svenska", "swedish"),
    ("norsk", "norwegian"),
    ("dansk", "danish"),
    ("suomi", "finnish"),
    ("íslenska", "icelandic"),
    ("ελληνικά", "greek"),
    ("türkçe", "turkish"),
    ("turkce", "turkish"),
    ("čeština", "czech"),
    ("cestina", "czech"),
    ("magyar", "hungarian"),
    ("română", "romanian"),
    ("romana", "romanian"),
    ("български", "bulgarian"),
    ("русский", "russian"),
    ("украї́нська", "ukrainian"),
    ("українська", "ukrainian"),
    ("беларуская", "belarusian"),
    ("српски", "serbian"),
    ("srpski", "serbian"),
    ("hrvatski", "croatian"),
    ("slovenščina", "slovenian"),
    ("slovenčina", "slovak"),
    ("lietuvių", "lithuanian"),
    ("latviešu", "latvian"),
    ("eesti", "estonian"),
    ("shqip", "albanian"),
    ("македонски", "macedonian"),
    ("日本語", "japanese"),
    ("中文", "chinese"),
    ("普通话", "chinese"),
    ("mandarin", "chinese"),
    ("cantonese", "chinese"),
    ("한국어", "korean"),
    ("العربية", "arabic"),
    ("עברית", "hebrew"),
    ("فارسی", "persian"),
    ("farsi", "persian"),
    ("हिन्दी", "hindi"),
    ("ไทย", "thai"),
    ("ภาษาไทย", "thai"),
    ("tiếng việt", "vietnamese"),
    ("bahasa indonesia", "indonesian"),
    ("bahasa melayu", "malay"),
    ("filipino", "tagalog"),
    ("kiswahili", "swahili"),
    ("қазақша", "kazakh"),
    ("oʻzbekcha", "uzbek"),
    ("ქართული", "georgian"),
    ("հայերեն", "armenian"),
    ("azərbaycanca", "azerbaijani"),
    ("català", "catalan"),
    ("galego", "galician"),
    ("euskara", "basque"),
    ("cymraeg", "welsh"),
    ("gaeilge", "irish"),
    // Regional dialect labels collapsed to the base language
    ("brazilian portuguese", "portuguese"),
    ("swiss german", "german"),
    ("schweizerdeutsch", "german"),
    ("austrian german", "german"),
    ("mexican spanish", "spanish"),
    ("latin spanish", "spanish"),
    ("american english", "english"),
    ("british english", "english"),
    // Common misspellings and wrong-field values
    ("enlgish", "english"),
    ("engish", "english"),
    ("englisch", "english"),
    ("ingles", "english"),
    ("inglés", "english"),
    ("germany", "german"),
    ("spainish", "spanish"),
    ("portugese", "portuguese"),
    ("potuguese", "portuguese"),
    ("franzosisch", "french"),
    ("niderlandzki", "dutch"),
];

/// Canonicalizes a single free-text language label. Unknown labels pass
/// through as their own lowercase-trimmed form rather than erroring; the
/// catalog is too noisy to treat an unrecognized label as a failure.
pub fn normalize(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    for (alias, canonical) in ALIASES {
        if *alias == key {
            return (*canonical).to_string();
        }
    }
    key
}

/// Splits a raw multi-language field into normalized tokens. The directory
/// mixes comma and semicolon separators; empty fragments are dropped.
pub fn split_tokens(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether a normalized token serves the given official language under the
/// configured strictness. Substring containment runs both directions so
/// compound forms like "norwegian bokmål" still match "norwegian".
pub fn token_matches(token: &str, official: &str, strictness: MatchStrictness) -> bool {
    match strictness {
        MatchStrictness::Exact => token == official,
        MatchStrictness::Substring => token.contains(official) || official.contains(token),
    }
}

/// Whether any token of a station's language field matches any of the
/// country's official languages.
pub fn station_matches(raw: &str, officials: &[String], strictness: MatchStrictness) -> bool {
    let tokens = split_tokens(raw);
    tokens
        .iter()
        .any(|t| officials.iter().any(|o| token_matches(t, o, strictness)))
}
