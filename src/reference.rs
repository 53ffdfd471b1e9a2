use crate::config::PipelineConfig;
use crate::directory::read_limited;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

const MAX_REFERENCE_BYTES: usize = 16 * 1024 * 1024;

/// Static lookup tables built once at startup: each country's ordered
/// official languages (first entry is primary) and its canonical display
/// name. Read-only for the rest of the run.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    languages_by_cc: HashMap<String, Vec<String>>,
    display_names: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    name: String,
    #[serde(default)]
    languages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LanguageEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Atlas {
    objects: AtlasObjects,
}

#[derive(Debug, Deserialize)]
struct AtlasObjects {
    countries: AtlasCountries,
}

#[derive(Debug, Deserialize)]
struct AtlasCountries {
    geometries: Vec<AtlasGeometry>,
}

#[derive(Debug, Deserialize)]
struct AtlasGeometry {
    // Numeric ISO id; some atlas builds emit it as a JSON number, some as a
    // string. Geometries without one are decorative (disputed areas etc.)
    // and never join.
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    properties: Option<AtlasProperties>,
}

#[derive(Debug, Deserialize)]
struct AtlasProperties {
    #[serde(default)]
    name: Option<String>,
}

/// ISO 3166-1 numeric codes (the atlas geometry ids, zero-padded) to
/// alpha-2. Static because the assignment is; covers every country the
/// 110m/50m atlases carry plus the common dependent territories.
const NUMERIC_CODES: &[(&str, &str)] = &[
    ("004", "AF"), ("008", "AL"), ("010", "AQ"), ("012", "DZ"), ("016", "AS"),
    ("020", "AD"), ("024", "AO"), ("028", "AG"), ("031", "AZ"), ("032", "AR"),
    ("036", "AU"), ("040", "AT"), ("044", "BS"), ("048", "BH"), ("050", "BD"),
    ("051", "AM"), ("052", "BB"), ("056", "BE"), ("060", "BM"), ("064", "BT"),
    ("068", "BO"), ("070", "BA"), ("072", "BW"), ("074", "BV"), ("076", "BR"),
    ("084", "BZ"), ("086", "IO"), ("090", "SB"), ("092", "VG"), ("096", "BN"),
    ("100", "BG"), ("104", "MM"), ("108", "BI"), ("112", "BY"), ("116", "KH"),
    ("120", "CM"), ("124", "CA"), ("132", "CV"), ("136", "KY"), ("140", "CF"),
    ("144", "LK"), ("148", "TD"), ("152", "CL"), ("156", "CN"), ("158", "TW"),
    ("162", "CX"), ("166", "CC"), ("170", "CO"), ("174", "KM"), ("175", "YT"),
    ("178", "CG"), ("180", "CD"), ("184", "CK"), ("188", "CR"), ("191", "HR"),
    ("192", "CU"), ("196", "CY"), ("203", "CZ"), ("204", "BJ"), ("208", "DK"),
    ("212", "DM"), ("214", "DO"), ("218", "EC"), ("222", "SV"), ("226", "GQ"),
    ("231", "ET"), ("232", "ER"), ("233", "EE"), ("238", "FK"), ("242", "FJ"),
    ("246", "FI"), ("248", "AX"), ("250", "FR"), ("254", "GF"), ("258", "PF"),
    ("260", "TF"), ("262", "DJ"), ("266", "GA"), ("268", "GE"), ("270", "GM"),
    ("275", "PS"), ("276", "DE"), ("288", "GH"), ("292", "GI"), ("296", "KI"),
    ("300", "GR"), ("304", "GL"), ("308", "GD"), ("312", "GP"), ("316", "GU"),
    ("320", "GT"), ("324", "GN"), ("328", "GY"), ("332", "HT"), ("334", "HM"),
    ("336", "VA"), ("340", "HN"), ("344", "HK"), ("348", "HU"), ("352", "IS"),
    ("356", "IN"), ("360", "ID"), ("364", "IR"), ("368", "IQ"), ("372", "IE"),
    ("376", "IL"), ("380", "IT"), ("384", "CI"), ("388", "JM"), ("392", "JP"),
    ("398", "KZ"), ("400", "JO"), ("404", "KE"), ("408", "KP"), ("410", "KR"),
    ("414", "KW"), ("417", "KG"), ("418", "LA"), ("422", "LB"), ("426", "LS"),
    ("428", "LV"), ("430", "LR"), ("434", "LY"), ("438", "LI"), ("440", "LT"),
    ("442", "LU"), ("446", "MO"), ("450", "MG"), ("454", "MW"), ("458", "MY"),
    ("462", "MV"), ("466", "ML"), ("470", "MT"), ("474", "MQ"), ("478", "MR"),
    ("480", "MU"), ("484", "MX"), ("492", "MC"), ("496", "MN"), ("498", "MD"),
    ("499", "ME"), ("500", "MS"), ("504", "MA"), ("508", "MZ"), ("512", "OM"),
    ("516", "NA"), ("520", "NR"), ("524", "NP"), ("528", "NL"), ("531", "CW"),
    ("533", "AW"), ("540", "NC"), ("548", "VU"), ("554", "NZ"), ("558", "NI"),
    ("562", "NE"), ("566", "NG"), ("570", "NU"), ("574", "NF"), ("578", "NO"),
    ("580", "MP"), ("581", "UM"), ("583", "FM"), ("584", "MH"), ("585", "PW"),
    ("586", "PK"), ("591", "PA"), ("598", "PG"), ("600", "PY"), ("604", "PE"),
    ("608", "PH"), ("612", "PN"), ("616", "PL"), ("620", "PT"), ("624", "GW"),
    ("626", "TL"), ("630", "PR"), ("634", "QA"), ("638", "RE"), ("642", "RO"),
    ("643", "RU"), ("646", "RW"), ("652", "BL"), ("654", "SH"), ("659", "KN"),
    ("660", "AI"), ("662", "LC"), ("663", "MF"), ("666", "PM"), ("670", "VC"),
    ("674", "SM"), ("678", "ST"), ("682", "SA"), ("686", "SN"), ("688", "RS"),
    ("690", "SC"), ("694", "SL"), ("702", "SG"), ("703", "SK"), ("704", "VN"),
    ("705", "SI"), ("706", "SO"), ("710", "ZA"), ("716", "ZW"), ("724", "ES"),
    ("728", "SS"), ("729", "SD"), ("732", "EH"), ("740", "SR"), ("744", "SJ"),
    ("748", "SZ"), ("752", "SE"), ("756", "CH"), ("760", "SY"), ("762", "TJ"),
    ("764", "TH"), ("768", "TG"), ("772", "TK"), ("776", "TO"), ("780", "TT"),
    ("784", "AE"), ("788", "TN"), ("792", "TR"), ("795", "TM"), ("796", "TC"),
    ("798", "TV"), ("800", "UG"), ("804", "UA"), ("807", "MK"), ("818", "EG"),
    ("826", "GB"), ("831", "GG"), ("832", "JE"), ("833", "IM"), ("834", "TZ"),
    ("840", "US"), ("850", "VI"), ("854", "BF"), ("858", "UY"), ("860", "UZ"),
    ("862", "VE"), ("876", "WF"), ("882", "WS"), ("887", "YE"), ("894", "ZM"),
];

/// Resolves an atlas geometry id to an alpha-2 code. Ids appear as padded
/// strings in some atlas builds and bare numbers in others.
fn numeric_to_alpha2(id: &serde_json::Value) -> Option<&'static str> {
    let key = match id {
        serde_json::Value::String(s) => format!("{:0>3}", s.trim()),
        serde_json::Value::Number(n) => format!("{:03}", n.as_u64()?),
        _ => return None,
    };
    NUMERIC_CODES
        .iter()
        .find(|(numeric, _)| *numeric == key)
        .map(|(_, alpha2)| *alpha2)
}

impl ReferenceData {
    /// Fetches the countries, languages, and world-geometry reference
    /// documents and builds the lookup tables. Any malformed payload is
    /// fatal; the pipeline cannot sample fairly without them.
    pub async fn load(http: &reqwest::Client, cfg: &PipelineConfig) -> Result<Self> {
        let countries = fetch_document(http, &cfg.countries_url).await?;
        let languages = fetch_document(http, &cfg.languages_url).await?;
        let atlas = fetch_document(http, &cfg.atlas_url).await?;
        let data = Self::build(&countries, &languages, &atlas)?;
        info!(
            countries = data.languages_by_cc.len(),
            display_names = data.display_names.len(),
            "reference data loaded"
        );
        Ok(data)
    }

    /// Pure construction from raw document bytes, split out so tests can
    /// feed frozen fixtures.
    pub fn build(countries_json: &[u8], languages_json: &[u8], atlas_json: &[u8]) -> Result<Self> {
        let countries: HashMap<String, CountryEntry> =
            serde_json::from_slice(countries_json).context("Invalid countries reference payload")?;
        let languages: HashMap<String, LanguageEntry> =
            serde_json::from_slice(languages_json).context("Invalid languages reference payload")?;
        let atlas: Atlas =
            serde_json::from_slice(atlas_json).context("Invalid world-geometry reference payload")?;
        if atlas.objects.countries.geometries.is_empty() {
            return Err(anyhow!("World-geometry payload has no country geometries"));
        }

        let mut languages_by_cc = HashMap::new();
        let mut display_names = HashMap::new();
        // Lowercased country name -> cc, for joining against atlas names.
        let mut by_name: HashMap<String, String> = HashMap::new();

        for (cc, entry) in &countries {
            let cc = cc.to_uppercase();
            let names: Vec<String> = entry
                .languages
                .iter()
                .map(|code| match languages.get(code) {
                    Some(lang) => lang.name.to_lowercase(),
                    // Unknown code: fall back to the code itself rather than
                    // dropping the language slot.
                    None => code.to_lowercase(),
                })
                .collect();
            languages_by_cc.insert(cc.clone(), names);
            display_names.insert(cc.clone(), entry.name.clone());
            by_name.insert(entry.name.to_lowercase(), cc);
        }

        // Atlas names win where they join: the client keys its globe geometry
        // by the atlas spelling, and output keys must line up with it. The
        // numeric geometry id is authoritative; the name join only catches
        // geometries without one.
        for geometry in &atlas.objects.countries.geometries {
            let Some(name) = geometry.properties.as_ref().and_then(|p| p.name.as_deref()) else {
                continue;
            };
            let cc = geometry
                .id
                .as_ref()
                .and_then(numeric_to_alpha2)
                .map(str::to_string)
                .or_else(|| by_name.get(&name.to_lowercase()).cloned());
            if let Some(cc) = cc {
                display_names.insert(cc, name.to_string());
            }
        }

        Ok(Self {
            languages_by_cc,
            display_names,
        })
    }

    /// Ordered official languages for a country, primary first. `None` when
    /// the reference data has no profile (sampling then skips weighting).
    pub fn official_languages(&self, cc: &str) -> Option<&[String]> {
        self.languages_by_cc
            .get(cc)
            .map(|v| v.as_slice())
            .filter(|v| !v.is_empty())
    }

    pub fn display_name(&self, cc: &str) -> Option<&str> {
        self.display_names.get(cc).map(|s| s.as_str())
    }
}

async fn fetch_document(http: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let resp = http
        .get(url)
        .send()
        .await
        .with_context(|| format!("Reference fetch failed: {url}"))?;
    if !resp.status().is_success() {
        return Err(anyhow!("Reference fetch {url} returned {}", resp.status()));
    }
    read_limited(resp, MAX_REFERENCE_BYTES).await
}
