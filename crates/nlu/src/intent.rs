//! Rule-based intent classification
//!
//! Each single intent owns a curated trigger set (English tokens, Devanagari
//! substrings, and romanized-Hindi tokens). A query's score for an intent is
//! the fraction of that intent's triggers it matches; the highest score wins
//! with ties broken by the fixed intent priority order. When two or more
//! intents clear the activation threshold the query is reclassified as
//! `complex` so the router aggregates multiple backends.

use krishimitra_core::Intent;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Minimum score an intent must exceed to count as activated
const ACTIVATION_THRESHOLD: f32 = 0.05;

/// Classification result
#[derive(Debug, Clone)]
pub struct Classification {
    pub intent: Intent,
    /// Score of the winning intent, in [0,1]
    pub confidence: f32,
    /// Activated single intents in priority order; len >= 2 exactly when
    /// `intent` is `Complex`
    pub activated: Vec<Intent>,
}

/// One intent's trigger set
struct TriggerSet {
    intent: Intent,
    /// Single Latin words are matched as whole tokens; multi-word and
    /// non-Latin triggers are matched as substrings.
    triggers: &'static [&'static str],
}

pub struct IntentClassifier {
    sets: Vec<TriggerSet>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        let sets = vec![
            TriggerSet {
                intent: Intent::Greeting,
                triggers: &[
                    "hello", "hi", "hey", "namaste", "namaskar", "good morning",
                    "good afternoon", "good evening", "thank you", "dhanyavaad", "bye",
                    "नमस्ते", "नमस्कार", "धन्यवाद",
                ],
            },
            TriggerSet {
                intent: Intent::Weather,
                triggers: &[
                    "weather", "rain", "temperature", "humidity", "forecast", "climate",
                    "barish", "mausam", "मौसम", "बारिश", "तापमान", "पूर्वानुमान",
                ],
            },
            TriggerSet {
                intent: Intent::Market,
                triggers: &[
                    "price", "prices", "cost", "rate", "market", "mandi", "bazar", "bhav",
                    "sell", "msp", "कीमत", "मूल्य", "बाजार", "मंडी",
                ],
            },
            TriggerSet {
                intent: Intent::CropRecommendation,
                triggers: &[
                    "crop", "crops", "fasal", "plant", "grow", "sow", "sowing", "cultivate",
                    "lagayein", "ugaye", "kheti", "फसल", "बुवाई", "उगाना", "खेती",
                ],
            },
            TriggerSet {
                intent: Intent::Scheme,
                triggers: &[
                    "scheme", "schemes", "subsidy", "yojana", "loan", "credit", "pm kisan",
                    "kisan credit", "योजना", "सब्सिडी", "ऋण", "सरकारी",
                ],
            },
            TriggerSet {
                intent: Intent::Pest,
                triggers: &[
                    "pest", "pests", "disease", "insect", "fungus", "keet", "rog",
                    "pesticide", "कीट", "रोग", "कीड़े", "बीमारी",
                ],
            },
        ];

        Self { sets }
    }

    /// Classify normalized query text.
    ///
    /// Deterministic: identical text always yields the same result.
    pub fn classify(&self, text: &str) -> Classification {
        let tokens: HashSet<&str> = text.unicode_words().collect();

        let mut scored: Vec<(Intent, f32)> = self
            .sets
            .iter()
            .map(|set| (set.intent, score_triggers(text, &tokens, set.triggers)))
            .collect();

        // Highest score first; fixed priority breaks ties
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.priority().cmp(&b.0.priority()))
        });

        let activated: Vec<Intent> = {
            let mut hits: Vec<Intent> = scored
                .iter()
                .filter(|(_, score)| *score > ACTIVATION_THRESHOLD)
                .map(|(intent, _)| *intent)
                .collect();
            hits.sort_by_key(|i| i.priority());
            hits
        };

        let (top_intent, top_score) = scored[0];

        if activated.len() >= 2 {
            tracing::debug!(intents = ?activated, "multi-intent query, routing as complex");
            return Classification {
                intent: Intent::Complex,
                confidence: top_score,
                activated,
            };
        }

        if activated.is_empty() {
            // Not an error by design: unmatched queries resolve to `general`
            return Classification {
                intent: Intent::General,
                confidence: 0.0,
                activated: Vec::new(),
            };
        }

        Classification {
            intent: top_intent,
            confidence: top_score,
            activated,
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Fraction of triggers the text matches
fn score_triggers(text: &str, tokens: &HashSet<&str>, triggers: &[&str]) -> f32 {
    let matched = triggers
        .iter()
        .filter(|trigger| trigger_matches(text, tokens, trigger))
        .count();
    matched as f32 / triggers.len().max(1) as f32
}

fn trigger_matches(text: &str, tokens: &HashSet<&str>, trigger: &str) -> bool {
    let is_single_latin_word = trigger.is_ascii() && !trigger.contains(' ');
    if is_single_latin_word {
        tokens.contains(trigger)
    } else {
        text.contains(trigger)
    }
}
