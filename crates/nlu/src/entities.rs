//! Dictionary-based entity extraction
//!
//! Curated dictionaries for crops, locations, and seasons, each with
//! language-specific synonyms including transliterations. Extraction returns
//! the first canonical match per entity type in declared dictionary order;
//! absence leaves the entity unset and callers supply a default.

use krishimitra_core::{Coordinates, EntityMap};
use once_cell::sync::Lazy;
use regex::Regex;

/// One dictionary entry: canonical form plus lowercase/Devanagari synonyms
struct Entry {
    canonical: &'static str,
    synonyms: &'static [&'static str],
}

const CROPS: &[Entry] = &[
    Entry { canonical: "Wheat", synonyms: &["wheat", "gehun", "gehu", "गेहूं", "गेहूँ"] },
    Entry { canonical: "Rice", synonyms: &["rice", "paddy", "chawal", "dhaan", "चावल", "धान"] },
    Entry { canonical: "Maize", synonyms: &["maize", "corn", "makka", "मक्का"] },
    Entry { canonical: "Cotton", synonyms: &["cotton", "kapas", "कपास"] },
    Entry { canonical: "Sugarcane", synonyms: &["sugarcane", "ganna", "गन्ना"] },
    Entry { canonical: "Onion", synonyms: &["onion", "pyaz", "प्याज"] },
    Entry { canonical: "Soybean", synonyms: &["soybean", "soya", "सोयाबीन"] },
    Entry { canonical: "Mustard", synonyms: &["mustard", "sarson", "सरसों"] },
    Entry { canonical: "Chickpea", synonyms: &["chickpea", "chana", "gram", "चना"] },
];

/// Major cities with coordinates for nearest-city resolution
struct City {
    entry: Entry,
    lat: f64,
    lon: f64,
}

const CITIES: &[City] = &[
    City { entry: Entry { canonical: "Delhi", synonyms: &["delhi", "dilli", "दिल्ली"] }, lat: 28.6139, lon: 77.2090 },
    City { entry: Entry { canonical: "Mumbai", synonyms: &["mumbai", "bombay", "मुंबई"] }, lat: 19.0760, lon: 72.8777 },
    City { entry: Entry { canonical: "Kolkata", synonyms: &["kolkata", "calcutta", "कोलकाता"] }, lat: 22.5726, lon: 88.3639 },
    City { entry: Entry { canonical: "Chennai", synonyms: &["chennai", "madras", "चेन्नई"] }, lat: 13.0827, lon: 80.2707 },
    City { entry: Entry { canonical: "Bangalore", synonyms: &["bangalore", "bengaluru", "बैंगलोर"] }, lat: 12.9716, lon: 77.5946 },
    City { entry: Entry { canonical: "Hyderabad", synonyms: &["hyderabad", "हैदराबाद"] }, lat: 17.3850, lon: 78.4867 },
    City { entry: Entry { canonical: "Pune", synonyms: &["pune", "पुणे"] }, lat: 18.5204, lon: 73.8567 },
    City { entry: Entry { canonical: "Ahmedabad", synonyms: &["ahmedabad", "अहमदाबाद"] }, lat: 23.0225, lon: 72.5714 },
    City { entry: Entry { canonical: "Jaipur", synonyms: &["jaipur", "जयपुर"] }, lat: 26.9124, lon: 75.7873 },
    City { entry: Entry { canonical: "Lucknow", synonyms: &["lucknow", "लखनऊ"] }, lat: 26.8467, lon: 80.9462 },
];

const SEASONS: &[Entry] = &[
    Entry { canonical: "Kharif", synonyms: &["kharif", "monsoon", "खरीफ"] },
    Entry { canonical: "Rabi", synonyms: &["rabi", "winter", "रबी"] },
    Entry { canonical: "Zaid", synonyms: &["zaid", "zayad", "summer", "जायद"] },
];

pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract crop/location/season from normalized text.
    ///
    /// Deterministic: first canonical match per type, in dictionary order.
    pub fn extract(&self, text: &str) -> EntityMap {
        EntityMap {
            crop: first_match(text, CROPS),
            location: first_match_city(text),
            season: first_match(text, SEASONS),
        }
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn first_match(text: &str, entries: &[Entry]) -> Option<String> {
    entries
        .iter()
        .find(|entry| entry.synonyms.iter().any(|syn| text.contains(syn)))
        .map(|entry| entry.canonical.to_string())
}

fn first_match_city(text: &str) -> Option<String> {
    CITIES
        .iter()
        .find(|city| city.entry.synonyms.iter().any(|syn| text.contains(syn)))
        .map(|city| city.entry.canonical.to_string())
}

static COORD_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(-?\d{1,2}\.\d+)\s*,\s*(-?\d{1,3}\.\d+)").expect("coordinate pattern")
});

/// Pull a decimal `lat, lon` pair out of free text. Out-of-range pairs are
/// ignored rather than reported.
pub fn parse_coordinates(text: &str) -> Option<Coordinates> {
    let caps = COORD_PAIR.captures(text)?;
    let latitude: f64 = caps[1].parse().ok()?;
    let longitude: f64 = caps[2].parse().ok()?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some(Coordinates {
        latitude,
        longitude,
    })
}

/// Resolve coordinates to the nearest city in the dictionary. Used to pick
/// a default location when the query text names none.
pub fn nearest_city(coords: Coordinates) -> &'static str {
    let mut best = &CITIES[0];
    let mut best_dist = f64::MAX;
    for city in CITIES {
        let dlat = city.lat - coords.latitude;
        let dlon = city.lon - coords.longitude;
        let dist = dlat * dlat + dlon * dlon;
        if dist < best_dist {
            best_dist = dist;
            best = city;
        }
    }
    best.entry.canonical
}
