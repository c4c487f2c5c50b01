//! Response generation
//!
//! Two responders sit behind the `Responder` trait: a plain template
//! renderer and a rule-based variant that adds a conversational lead-in.
//! Templates exist for English, Hindi, and Hinglish; every other language
//! tag falls back to the English template while keeping its own tag on the
//! reply. `{placeholder}` slots resolve from extracted entities first, then
//! by dotted path into the source payload; unresolved slots render as a
//! neutral dash.

use krishimitra_core::{EntityMap, Intent, Language, Payload, Responder};
use serde_json::Value;

/// Rendered in place of a placeholder nothing resolves
const UNRESOLVED: &str = "—";

/// Reply used when every hop of a fallback chain failed
pub fn apology(language: Language) -> String {
    match language {
        Language::Hindi => {
            "क्षमा करें, अभी ताज़ा जानकारी नहीं मिल पाई। कृपया थोड़ी देर बाद पुनः प्रयास करें।".to_string()
        }
        Language::Hinglish => {
            "Maaf kijiye, abhi taaza jaankari nahi mil paayi. Thodi der baad phir koshish karein.".to_string()
        }
        _ => "Sorry, I could not fetch live data right now. Please try again in a while.".to_string(),
    }
}

/// Template family a language renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    English,
    Hindi,
    Hinglish,
}

impl Family {
    fn of(language: Language) -> Self {
        match language {
            Language::Hindi => Self::Hindi,
            Language::Hinglish => Self::Hinglish,
            _ => Self::English,
        }
    }
}

fn template(intent: Intent, family: Family) -> &'static str {
    use Family::*;
    match (intent, family) {
        (Intent::Greeting, English) => {
            "Namaste! I am Krishimitra, your farming assistant. Ask me about weather, mandi prices, crops, schemes, or pests."
        }
        (Intent::Greeting, Hindi) => {
            "नमस्ते! मैं कृषिमित्र हूं। मौसम, मंडी भाव, फसल, योजना या कीट के बारे में पूछें।"
        }
        (Intent::Greeting, Hinglish) => {
            "Namaste! Main Krishimitra hoon. Mausam, mandi bhav, fasal, yojana ya keet ke baare mein poochhein."
        }
        (Intent::Weather, English) => {
            "Weather in {location}: {condition}, around {temperature_c}°C with {humidity_pct}% humidity. {advisory}"
        }
        (Intent::Weather, Hindi) => {
            "{location} का मौसम: {condition}, लगभग {temperature_c}°C, नमी {humidity_pct}%। {advisory}"
        }
        (Intent::Weather, Hinglish) => {
            "{location} ka mausam: {condition}, lagbhag {temperature_c}°C, nami {humidity_pct}%. {advisory}"
        }
        (Intent::Market, English) => {
            "Market rates for {location}: wheat MSP ₹{msp.wheat}/quintal, rice ₹{msp.rice}, maize ₹{msp.maize}, cotton ₹{msp.cotton}. {note}"
        }
        (Intent::Market, Hindi) => {
            "{location} के बाजार भाव: गेहूं MSP ₹{msp.wheat}/क्विंटल, चावल ₹{msp.rice}, मक्का ₹{msp.maize}, कपास ₹{msp.cotton}। {note}"
        }
        (Intent::Market, Hinglish) => {
            "{location} ke mandi bhav: gehun MSP ₹{msp.wheat}/quintal, chawal ₹{msp.rice}, makka ₹{msp.maize}, kapas ₹{msp.cotton}. {note}"
        }
        (Intent::CropRecommendation, English) => {
            "Recommended crops near {location} for {season}: {recommendations}. {note}"
        }
        (Intent::CropRecommendation, Hindi) => {
            "{location} के पास {season} के लिए अनुशंसित फसलें: {recommendations}। {note}"
        }
        (Intent::CropRecommendation, Hinglish) => {
            "{location} ke paas {season} ke liye sujhayi gayi fasalein: {recommendations}. {note}"
        }
        (Intent::Scheme, English) => "Schemes you may be eligible for: {schemes}.",
        (Intent::Scheme, Hindi) => "आपके लिए उपयोगी योजनाएं: {schemes}।",
        (Intent::Scheme, Hinglish) => "Aapke liye upyogi yojanayein: {schemes}.",
        (Intent::Pest, English) => "{general} Watch for: {common}.",
        (Intent::Pest, Hindi) => "{general} इन पर नज़र रखें: {common}।",
        (Intent::Pest, Hinglish) => "{general} In par nazar rakhein: {common}.",
        (Intent::General | Intent::Complex, English) => {
            "I can help with weather, mandi prices, crop selection, government schemes, and pest control. Ask me about any of these."
        }
        (Intent::General | Intent::Complex, Hindi) => {
            "मैं मौसम, मंडी भाव, फसल चयन, सरकारी योजनाओं और कीट नियंत्रण में मदद कर सकता हूं। इनमें से कुछ भी पूछें।"
        }
        (Intent::General | Intent::Complex, Hinglish) => {
            "Main mausam, mandi bhav, fasal chayan, sarkari yojana aur keet niyantran mein madad kar sakta hoon. Inmein se kuchh bhi poochhein."
        }
    }
}

/// Conversational lead-in the rule-based responder prepends
fn lead_in(intent: Intent, family: Family) -> Option<&'static str> {
    use Family::*;
    match (intent, family) {
        (Intent::Greeting | Intent::General | Intent::Complex, _) => None,
        (Intent::Weather, English) => Some("Here is the latest weather update."),
        (Intent::Weather, Hindi) => Some("मौसम की ताज़ा जानकारी यह रही।"),
        (Intent::Weather, Hinglish) => Some("Mausam ki taaza jaankari yeh rahi."),
        (Intent::Market, English) => Some("Here are today's rates."),
        (Intent::Market, Hindi) => Some("आज के भाव यह रहे।"),
        (Intent::Market, Hinglish) => Some("Aaj ke bhav yeh rahe."),
        (Intent::CropRecommendation, English) => Some("Based on the season, here is my suggestion."),
        (Intent::CropRecommendation, Hindi) => Some("मौसम के अनुसार मेरा सुझाव यह है।"),
        (Intent::CropRecommendation, Hinglish) => Some("Season ke hisaab se mera sujhav yeh hai."),
        (Intent::Scheme, English) => Some("Good news, there is government support for this."),
        (Intent::Scheme, Hindi) => Some("अच्छी खबर, इसके लिए सरकारी सहायता उपलब्ध है।"),
        (Intent::Scheme, Hinglish) => Some("Achhi khabar, iske liye sarkari sahayata uplabdh hai."),
        (Intent::Pest, English) => Some("Act early, pest damage spreads fast."),
        (Intent::Pest, Hindi) => Some("जल्दी कदम उठाएं, कीट का नुकसान तेज़ी से फैलता है।"),
        (Intent::Pest, Hinglish) => Some("Jaldi kadam uthayein, keet ka nuksan tezi se failta hai."),
    }
}

/// Plain template renderer
pub struct TemplateResponder;

impl TemplateResponder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TemplateResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl Responder for TemplateResponder {
    fn render(
        &self,
        intent: Intent,
        entities: &EntityMap,
        data: Option<&Payload>,
        language: Language,
    ) -> String {
        let family = Family::of(language);
        interpolate(template(intent, family), entities, data)
    }
}

/// Template renderer with a conversational lead-in per intent
pub struct RuleBasedResponder {
    inner: TemplateResponder,
}

impl RuleBasedResponder {
    pub fn new() -> Self {
        Self {
            inner: TemplateResponder::new(),
        }
    }
}

impl Default for RuleBasedResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl Responder for RuleBasedResponder {
    fn render(
        &self,
        intent: Intent,
        entities: &EntityMap,
        data: Option<&Payload>,
        language: Language,
    ) -> String {
        let body = self.inner.render(intent, entities, data, language);
        match lead_in(intent, Family::of(language)) {
            Some(lead) => format!("{lead} {body}"),
            None => body,
        }
    }
}

/// Build the responder configured in settings.
pub fn build_responder(kind: krishimitra_config::ResponderKind) -> Box<dyn Responder> {
    match kind {
        krishimitra_config::ResponderKind::Template => Box::new(TemplateResponder::new()),
        krishimitra_config::ResponderKind::RuleBased => Box::new(RuleBasedResponder::new()),
    }
}

/// Fill `{placeholder}` slots. Entities win over payload fields; dotted
/// names walk nested payload objects.
fn interpolate(template: &str, entities: &EntityMap, data: Option<&Payload>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let mut name = String::new();
        let mut closed = false;
        for inner in chars.by_ref() {
            if inner == '}' {
                closed = true;
                break;
            }
            name.push(inner);
        }
        if closed {
            out.push_str(&resolve(&name, entities, data));
        } else {
            out.push('{');
            out.push_str(&name);
        }
    }
    out
}

fn resolve(name: &str, entities: &EntityMap, data: Option<&Payload>) -> String {
    let from_entities = match name {
        "location" => entities.location.clone(),
        "crop" => entities.crop.clone(),
        "season" => entities.season.clone(),
        _ => None,
    };
    if let Some(value) = from_entities {
        return value;
    }

    let Some(payload) = data else {
        return UNRESOLVED.to_string();
    };

    match name {
        "recommendations" => season_recommendations(entities, payload),
        "schemes" => scheme_list(payload),
        "common" => pest_list(payload),
        _ => lookup_path(payload, name)
            .map(render_value)
            .unwrap_or_else(|| UNRESOLVED.to_string()),
    }
}

/// Crops for the extracted season, defaulting to kharif
fn season_recommendations(entities: &EntityMap, payload: &Payload) -> String {
    let season = entities
        .season
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_else(|| "kharif".to_string());
    match payload.get(&season) {
        Some(Value::Array(crops)) => join_strings(crops),
        _ => UNRESOLVED.to_string(),
    }
}

fn scheme_list(payload: &Payload) -> String {
    let Some(Value::Array(schemes)) = payload.get("schemes") else {
        return UNRESOLVED.to_string();
    };
    let parts: Vec<String> = schemes
        .iter()
        .filter_map(|s| {
            let name = s.get("name")?.as_str()?;
            let benefit = s.get("benefit").and_then(Value::as_str).unwrap_or("");
            Some(if benefit.is_empty() {
                name.to_string()
            } else {
                format!("{name} ({benefit})")
            })
        })
        .collect();
    if parts.is_empty() {
        UNRESOLVED.to_string()
    } else {
        parts.join("; ")
    }
}

fn pest_list(payload: &Payload) -> String {
    let Some(Value::Array(items)) = payload.get("common") else {
        return UNRESOLVED.to_string();
    };
    let parts: Vec<String> = items
        .iter()
        .filter_map(|item| {
            let pest = item.get("pest")?.as_str()?;
            let control = item.get("control").and_then(Value::as_str).unwrap_or("");
            Some(if control.is_empty() {
                pest.to_string()
            } else {
                format!("{pest} ({control})")
            })
        })
        .collect();
    if parts.is_empty() {
        UNRESOLVED.to_string()
    } else {
        parts.join("; ")
    }
}

fn lookup_path<'a>(payload: &'a Payload, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = payload.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => format_indian(i),
            None => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => join_strings(items),
        Value::Null => UNRESOLVED.to_string(),
        Value::Object(_) => UNRESOLVED.to_string(),
    }
}

fn join_strings(items: &[Value]) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    if parts.is_empty() {
        UNRESOLVED.to_string()
    } else {
        parts.join(", ")
    }
}

/// Indian digit grouping: last three digits, then pairs. 1234567 renders
/// as 12,34,567.
pub fn format_indian(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let formatted = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<String> = Vec::new();
        let head_bytes = head.as_bytes();
        let mut i = head_bytes.len();
        while i > 0 {
            let start = i.saturating_sub(2);
            groups.push(head[start..i].to_string());
            i = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };
    if negative {
        format!("-{formatted}")
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    fn entities(location: Option<&str>, season: Option<&str>) -> EntityMap {
        EntityMap {
            crop: None,
            location: location.map(String::from),
            season: season.map(String::from),
        }
    }

    #[test]
    fn test_indian_grouping() {
        assert_eq!(format_indian(999), "999");
        assert_eq!(format_indian(1000), "1,000");
        assert_eq!(format_indian(123456), "1,23,456");
        assert_eq!(format_indian(1234567), "12,34,567");
        assert_eq!(format_indian(-123456), "-1,23,456");
    }

    #[test]
    fn test_weather_render() {
        let data = payload(json!({
            "condition": "Sunny",
            "temperature_c": 31,
            "humidity_pct": 40,
            "advisory": "Irrigate in the evening.",
        }));
        let text = TemplateResponder::new().render(
            Intent::Weather,
            &entities(Some("Delhi"), None),
            Some(&data),
            Language::English,
        );
        assert!(text.contains("Delhi"));
        assert!(text.contains("Sunny"));
        assert!(text.contains("31°C"));
        assert!(text.contains("Irrigate"));
    }

    #[test]
    fn test_unresolved_placeholder_is_neutral() {
        let text = TemplateResponder::new().render(
            Intent::Weather,
            &entities(Some("Pune"), None),
            None,
            Language::English,
        );
        assert!(text.contains('—'));
        assert!(!text.contains('{'));
    }

    #[test]
    fn test_market_uses_indian_grouping_and_dotted_paths() {
        let data = payload(json!({
            "msp": {"wheat": 2275, "rice": 2183, "maize": 2090, "cotton": 6620},
            "note": "MSP for the current season.",
        }));
        let text = TemplateResponder::new().render(
            Intent::Market,
            &entities(Some("Jaipur"), None),
            Some(&data),
            Language::English,
        );
        assert!(text.contains("₹2,275"));
        assert!(text.contains("₹6,620"));
        assert!(text.contains("Jaipur"));
    }

    #[test]
    fn test_crop_recommendation_respects_season() {
        let data = payload(json!({
            "kharif": ["Rice", "Cotton"],
            "rabi": ["Wheat", "Mustard"],
            "note": "Consult your local KVK.",
        }));
        let responder = TemplateResponder::new();

        let rabi = responder.render(
            Intent::CropRecommendation,
            &entities(Some("Delhi"), Some("Rabi")),
            Some(&data),
            Language::English,
        );
        assert!(rabi.contains("Wheat, Mustard"));

        // Season unset defaults to kharif
        let default = responder.render(
            Intent::CropRecommendation,
            &entities(Some("Delhi"), None),
            Some(&data),
            Language::English,
        );
        assert!(default.contains("Rice, Cotton"));
    }

    #[test]
    fn test_scheme_list_rendering() {
        let data = payload(json!({
            "schemes": [
                {"name": "PM-Kisan", "benefit": "Rs 6,000 per year"},
                {"name": "KCC"},
            ],
        }));
        let text = TemplateResponder::new().render(
            Intent::Scheme,
            &EntityMap::default(),
            Some(&data),
            Language::English,
        );
        assert!(text.contains("PM-Kisan (Rs 6,000 per year)"));
        assert!(text.contains("KCC"));
    }

    #[test]
    fn test_language_families() {
        let responder = TemplateResponder::new();
        let hi = responder.render(Intent::Greeting, &EntityMap::default(), None, Language::Hindi);
        assert!(hi.contains("नमस्ते"));

        let hinglish =
            responder.render(Intent::Greeting, &EntityMap::default(), None, Language::Hinglish);
        assert!(hinglish.contains("Krishimitra hoon"));

        // Unscripted languages fall back to the English template
        let ta = responder.render(Intent::Greeting, &EntityMap::default(), None, Language::Tamil);
        assert!(ta.contains("farming assistant"));
    }

    #[test]
    fn test_rule_based_adds_lead_in() {
        let data = payload(json!({"condition": "Cloudy"}));
        let plain = TemplateResponder::new().render(
            Intent::Weather,
            &entities(Some("Delhi"), None),
            Some(&data),
            Language::English,
        );
        let chatty = RuleBasedResponder::new().render(
            Intent::Weather,
            &entities(Some("Delhi"), None),
            Some(&data),
            Language::English,
        );
        assert!(chatty.ends_with(&plain));
        assert!(chatty.len() > plain.len());
    }

    #[test]
    fn test_apology_localized() {
        assert!(apology(Language::Hindi).contains("क्षमा"));
        assert!(apology(Language::Hinglish).contains("Maaf"));
        assert!(apology(Language::English).contains("Sorry"));
    }
}
