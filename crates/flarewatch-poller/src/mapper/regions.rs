//! Static mapping of ISO 3166-1 alpha-2 country codes to UN M49 regions.

use once_cell::sync::Lazy;

use std::{collections::HashMap, fmt};

/// Geographic region of a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Africa,
    Americas,
    Antarctica,
    Asia,
    Europe,
    Oceania,
    /// Unknown or unassigned country code (e.g., `XX` or `T1` for Tor).
    Unknown,
}

impl Region {
    /// Returns the label value for this region.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Africa => "Africa",
            Self::Americas => "Americas",
            Self::Antarctica => "Antarctica",
            Self::Asia => "Asia",
            Self::Europe => "Europe",
            Self::Oceania => "Oceania",
            Self::Unknown => "Unknown",
        }
    }

    /// Resolves the region for a country code. Lookup is case-insensitive; unknown codes
    /// resolve to [`Self::Unknown`].
    pub fn of_country(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        REGIONS.get(code.as_str()).copied().unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[rustfmt::skip]
const AFRICA: &[&str] = &[
    // Northern Africa
    "DZ", "EG", "EH", "LY", "MA", "SD", "TN",
    // Eastern Africa
    "BI", "DJ", "ER", "ET", "IO", "KE", "KM", "MG", "MU", "MW", "MZ", "RE", "RW", "SC", "SO", "SS",
    "TF", "TZ", "UG", "YT", "ZM", "ZW",
    // Middle Africa
    "AO", "CD", "CF", "CG", "CM", "GA", "GQ", "ST", "TD",
    // Southern Africa
    "BW", "LS", "NA", "SZ", "ZA",
    // Western Africa
    "BF", "BJ", "CI", "CV", "GH", "GM", "GN", "GW", "LR", "ML", "MR", "NE", "NG", "SH", "SL", "SN",
    "TG",
];

#[rustfmt::skip]
const AMERICAS: &[&str] = &[
    // Caribbean
    "AG", "AI", "AW", "BB", "BL", "BQ", "BS", "CU", "CW", "DM", "DO", "GD", "GP", "HT", "JM", "KN",
    "KY", "LC", "MF", "MQ", "MS", "PR", "SX", "TC", "TT", "VC", "VG", "VI",
    // Central America
    "BZ", "CR", "GT", "HN", "MX", "NI", "PA", "SV",
    // South America
    "AR", "BO", "BR", "BV", "CL", "CO", "EC", "FK", "GF", "GS", "GY", "PE", "PY", "SR", "UY", "VE",
    // Northern America
    "BM", "CA", "GL", "PM", "US",
];

#[rustfmt::skip]
const ASIA: &[&str] = &[
    // Central Asia
    "KG", "KZ", "TJ", "TM", "UZ",
    // Eastern Asia
    "CN", "HK", "JP", "KP", "KR", "MN", "MO", "TW",
    // South-eastern Asia
    "BN", "ID", "KH", "LA", "MM", "MY", "PH", "SG", "TH", "TL", "VN",
    // Southern Asia
    "AF", "BD", "BT", "IN", "IR", "LK", "MV", "NP", "PK",
    // Western Asia
    "AE", "AM", "AZ", "BH", "CY", "GE", "IL", "IQ", "JO", "KW", "LB", "OM", "PS", "QA", "SA", "SY",
    "TR", "YE",
];

#[rustfmt::skip]
const EUROPE: &[&str] = &[
    // Eastern Europe
    "BG", "BY", "CZ", "HU", "MD", "PL", "RO", "RU", "SK", "UA",
    // Northern Europe
    "AX", "DK", "EE", "FI", "FO", "GB", "GG", "IE", "IM", "IS", "JE", "LT", "LV", "NO", "SE", "SJ",
    // Southern Europe
    "AD", "AL", "BA", "ES", "GI", "GR", "HR", "IT", "ME", "MK", "MT", "PT", "RS", "SI", "SM", "VA",
    "XK",
    // Western Europe
    "AT", "BE", "CH", "DE", "FR", "LI", "LU", "MC", "NL",
];

#[rustfmt::skip]
const OCEANIA: &[&str] = &[
    // Australia and New Zealand
    "AU", "CC", "CX", "HM", "NF", "NZ",
    // Melanesia
    "FJ", "NC", "PG", "SB", "VU",
    // Micronesia
    "FM", "GU", "KI", "MH", "MP", "NR", "PW", "UM",
    // Polynesia
    "AS", "CK", "NU", "PF", "PN", "TK", "TO", "TV", "WF", "WS",
];

const ANTARCTICA: &[&str] = &["AQ"];

static REGIONS: Lazy<HashMap<&'static str, Region>> = Lazy::new(|| {
    let groups = [
        (AFRICA, Region::Africa),
        (AMERICAS, Region::Americas),
        (ASIA, Region::Asia),
        (EUROPE, Region::Europe),
        (OCEANIA, Region::Oceania),
        (ANTARCTICA, Region::Antarctica),
    ];
    groups
        .into_iter()
        .flat_map(|(codes, region)| codes.iter().map(move |&code| (code, region)))
        .collect()
});
