//! Usage tracking and the graded intelligence report
//!
//! Counts queries, per-source outcomes, and keeps a bounded log of recent
//! queries. The intelligence score summarizes how much of the traffic is
//! answered from structured data rather than canned text:
//!
//!   0.4 * structured-query share
//! + 0.3 * live-or-cached share of structured answers
//! + 0.2 * primary-hop share of structured answers
//! + 0.1 * source diversity
//!
//! All state sits behind parking_lot locks; recording is cheap enough to do
//! inline on every request.

use chrono::{DateTime, Utc};
use krishimitra_core::{Intent, Language};
use krishimitra_sources::static_data::STATIC_SOURCE_NAME;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// Recent-query log capacity
const QUERY_LOG_CAPACITY: usize = 1000;

/// One answered query, as the router saw it
#[derive(Debug, Clone)]
pub struct QueryRecord {
    pub intent: Intent,
    pub language: Language,
    /// Name of the source (or responder) the answer came from
    pub source: String,
    pub cache_hit: bool,
    /// Whether a structured-data backend answered this query
    pub structured: bool,
    /// Whether the first hop of the fallback chain answered
    pub primary: bool,
}

#[derive(Debug, Clone, Serialize)]
struct LogEntry {
    timestamp: DateTime<Utc>,
    intent: String,
    language: String,
    source: String,
    cache_hit: bool,
}

#[derive(Debug, Default, Clone)]
struct SourceStats {
    calls: u64,
    successes: u64,
    last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Counters {
    total_queries: u64,
    structured_queries: u64,
    live_or_cached: u64,
    primary_answers: u64,
    cache_hits: u64,
    intents: HashMap<String, u64>,
}

pub struct UsageTracker {
    counters: RwLock<Counters>,
    sources: RwLock<HashMap<String, SourceStats>>,
    log: Mutex<VecDeque<LogEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceUsage {
    pub name: String,
    pub calls: u64,
    pub successes: u64,
    pub reliability_pct: f64,
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntelligenceReport {
    pub score: f64,
    pub grade: &'static str,
    pub structured_share: f64,
    pub live_share: f64,
    pub primary_share: f64,
    pub diversity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub total_queries: u64,
    pub structured_queries: u64,
    pub structured_pct: f64,
    pub cache_hits: u64,
    pub cache_hit_pct: f64,
    pub intents: HashMap<String, u64>,
    pub sources: Vec<SourceUsage>,
    pub intelligence: IntelligenceReport,
    pub recent_queries: usize,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(Counters::default()),
            sources: RwLock::new(HashMap::new()),
            log: Mutex::new(VecDeque::with_capacity(QUERY_LOG_CAPACITY)),
        }
    }

    pub fn record_query(&self, record: QueryRecord) {
        {
            let mut counters = self.counters.write();
            counters.total_queries += 1;
            *counters
                .intents
                .entry(record.intent.label().to_string())
                .or_default() += 1;
            if record.structured {
                counters.structured_queries += 1;
                if record.cache_hit || record.source != STATIC_SOURCE_NAME {
                    counters.live_or_cached += 1;
                }
                if record.primary {
                    counters.primary_answers += 1;
                }
            }
            if record.cache_hit {
                counters.cache_hits += 1;
            }
        }

        let mut log = self.log.lock();
        if log.len() == QUERY_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(LogEntry {
            timestamp: Utc::now(),
            intent: record.intent.label().to_string(),
            language: record.language.code().to_string(),
            source: record.source,
            cache_hit: record.cache_hit,
        });
    }

    /// Record the outcome of one fetch attempt against a named source.
    pub fn record_source_result(&self, name: &str, success: bool) {
        let mut sources = self.sources.write();
        let stats = sources.entry(name.to_string()).or_default();
        stats.calls += 1;
        if success {
            stats.successes += 1;
            stats.last_used = Some(Utc::now());
        }
    }

    pub fn report(&self) -> UsageReport {
        let counters = self.counters.read();
        let sources = self.sources.read();
        let log_len = self.log.lock().len();

        let mut source_usage: Vec<SourceUsage> = sources
            .iter()
            .map(|(name, stats)| SourceUsage {
                name: name.clone(),
                calls: stats.calls,
                successes: stats.successes,
                reliability_pct: pct(stats.successes, stats.calls),
                last_used: stats.last_used,
            })
            .collect();
        source_usage.sort_by(|a, b| b.calls.cmp(&a.calls).then(a.name.cmp(&b.name)));

        let structured_share = share(counters.structured_queries, counters.total_queries);
        let live_share = share(counters.live_or_cached, counters.structured_queries);
        let primary_share = share(counters.primary_answers, counters.structured_queries);
        let distinct_serving = sources.values().filter(|s| s.successes > 0).count();
        let diversity = (distinct_serving as f64 / 5.0).min(1.0);

        let score = 0.4 * structured_share + 0.3 * live_share + 0.2 * primary_share + 0.1 * diversity;

        UsageReport {
            total_queries: counters.total_queries,
            structured_queries: counters.structured_queries,
            structured_pct: pct(counters.structured_queries, counters.total_queries),
            cache_hits: counters.cache_hits,
            cache_hit_pct: pct(counters.cache_hits, counters.total_queries),
            intents: counters.intents.clone(),
            sources: source_usage,
            intelligence: IntelligenceReport {
                score,
                grade: grade(score),
                structured_share,
                live_share,
                primary_share,
                diversity,
            },
            recent_queries: log_len,
        }
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn share(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn pct(part: u64, whole: u64) -> f64 {
    share(part, whole) * 100.0
}

fn grade(score: f64) -> &'static str {
    match score {
        s if s >= 0.9 => "A+",
        s if s >= 0.8 => "A",
        s if s >= 0.7 => "B+",
        s if s >= 0.6 => "B",
        s if s >= 0.5 => "C+",
        s if s >= 0.4 => "C",
        _ => "D",
    }
}
