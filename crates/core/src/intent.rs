//! The closed intent set and backend source categories
//!
//! This is the single intent vocabulary for the whole engine. The router
//! keys its backend selection off `Intent::category()`; intents without a
//! category are answered directly by the responder.

use serde::{Deserialize, Serialize};

/// Coarse category of what the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Weather,
    Market,
    CropRecommendation,
    Scheme,
    Pest,
    /// Two or more single intents activated; the router aggregates them
    Complex,
    General,
}

impl Intent {
    /// Stable wire label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Weather => "weather",
            Self::Market => "market",
            Self::CropRecommendation => "crop_recommendation",
            Self::Scheme => "scheme",
            Self::Pest => "pest",
            Self::Complex => "complex",
            Self::General => "general",
        }
    }

    /// Fixed priority used to break score ties. Lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Greeting => 0,
            Self::Weather => 1,
            Self::Market => 2,
            Self::CropRecommendation => 3,
            Self::Scheme => 4,
            Self::Pest => 5,
            Self::Complex => 6,
            Self::General => 7,
        }
    }

    /// Backend category this intent needs, if any. `None` means the
    /// responder answers directly without cache or fetch.
    pub fn category(&self) -> Option<SourceCategory> {
        match self {
            Self::Weather => Some(SourceCategory::Weather),
            Self::Market => Some(SourceCategory::Market),
            Self::CropRecommendation => Some(SourceCategory::CropRecommendation),
            Self::Scheme => Some(SourceCategory::Scheme),
            Self::Pest => Some(SourceCategory::Pest),
            Self::Greeting | Self::Complex | Self::General => None,
        }
    }

    /// The single intents a classifier may activate (everything except the
    /// derived `complex` marker), in priority order.
    pub fn single_intents() -> &'static [Intent] {
        &[
            Self::Greeting,
            Self::Weather,
            Self::Market,
            Self::CropRecommendation,
            Self::Scheme,
            Self::Pest,
            Self::General,
        ]
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Structured-data backend categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    Weather,
    Market,
    CropRecommendation,
    Scheme,
    Pest,
}

impl SourceCategory {
    /// Stable label used in cache keys and usage reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Market => "market",
            Self::CropRecommendation => "crop_recommendation",
            Self::Scheme => "scheme",
            Self::Pest => "pest",
        }
    }

    pub fn all() -> &'static [SourceCategory] {
        &[
            Self::Weather,
            Self::Market,
            Self::CropRecommendation,
            Self::Scheme,
            Self::Pest,
        ]
    }
}

impl std::fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
