//! Static fallback payloads
//!
//! The terminal hop of every fallback chain. Payloads are compiled in and
//! never fail, so a data intent always gets an answer even with every
//! external endpoint down. Figures are government notifications (MSP,
//! subsidized fertilizer prices, central scheme terms) that change at most
//! seasonally.

use async_trait::async_trait;
use krishimitra_core::{DataSource, Params, Payload, SourceCategory, SourceError};
use once_cell::sync::Lazy;
use serde_json::json;

pub const STATIC_SOURCE_NAME: &str = "static_fallback";

static WEATHER: Lazy<Payload> = Lazy::new(|| {
    object(json!({
        "condition": "Partly cloudy",
        "temperature_c": 28,
        "humidity_pct": 65,
        "rainfall_mm": 0,
        "advisory": "No severe weather expected. Irrigate as per crop stage.",
        "stale": true,
    }))
});

static MARKET: Lazy<Payload> = Lazy::new(|| {
    object(json!({
        "unit": "INR per quintal",
        "msp": {
            "wheat": 2275,
            "rice": 2183,
            "maize": 2090,
            "cotton": 6620,
        },
        "fertilizer_inr_per_bag": {
            "urea": 242,
            "dap": 1350,
            "mop": 1750,
        },
        "note": "Minimum support prices for the current marketing season.",
        "stale": true,
    }))
});

static CROP_RECOMMENDATION: Lazy<Payload> = Lazy::new(|| {
    object(json!({
        "kharif": ["Rice", "Maize", "Cotton", "Soybean"],
        "rabi": ["Wheat", "Mustard", "Chickpea"],
        "zaid": ["Moong", "Watermelon", "Cucumber"],
        "note": "General season-wise suggestions. Consult your local KVK for soil-specific advice.",
        "stale": true,
    }))
});

static SCHEME: Lazy<Payload> = Lazy::new(|| {
    object(json!({
        "schemes": [
            {
                "name": "PM-Kisan Samman Nidhi",
                "benefit": "Rs 6,000 per year in three installments",
                "eligibility": "All landholding farmer families",
            },
            {
                "name": "Pradhan Mantri Fasal Bima Yojana",
                "benefit": "Crop insurance at 2% premium for kharif, 1.5% for rabi",
                "eligibility": "Farmers growing notified crops in notified areas",
            },
            {
                "name": "Kisan Credit Card",
                "benefit": "Short-term credit up to Rs 3 lakh at subsidized interest",
                "eligibility": "Farmers, tenant farmers, sharecroppers",
            },
        ],
        "stale": true,
    }))
});

static PEST: Lazy<Payload> = Lazy::new(|| {
    object(json!({
        "general": "Inspect crops weekly. Use pheromone traps before spraying.",
        "common": [
            {"pest": "Stem borer", "crops": ["Rice", "Maize"], "control": "Carbofuran granules or Trichogramma release"},
            {"pest": "Aphids", "crops": ["Mustard", "Wheat"], "control": "Imidacloprid spray at economic threshold"},
            {"pest": "Bollworm", "crops": ["Cotton"], "control": "Bt cotton varieties, NPV spray"},
        ],
        "stale": true,
    }))
});

fn object(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// Terminal fallback source backed by compiled-in payloads.
pub struct StaticSource;

#[async_trait]
impl DataSource for StaticSource {
    fn name(&self) -> &str {
        STATIC_SOURCE_NAME
    }

    async fn fetch(
        &self,
        category: SourceCategory,
        _params: &Params,
    ) -> Result<Payload, SourceError> {
        let payload = match category {
            SourceCategory::Weather => &*WEATHER,
            SourceCategory::Market => &*MARKET,
            SourceCategory::CropRecommendation => &*CROP_RECOMMENDATION,
            SourceCategory::Scheme => &*SCHEME,
            SourceCategory::Pest => &*PEST,
        };
        Ok(payload.clone())
    }
}
