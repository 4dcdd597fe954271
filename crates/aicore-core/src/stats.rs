//! Usage statistics accumulator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters for one provider, model or app
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageBucket {
    pub requests: u64,
    pub tokens: u64,
    pub cost: f64,
}

impl UsageBucket {
    fn add(&mut self, tokens: u64, cost: f64) {
        self.requests += 1;
        self.tokens += tokens;
        self.cost += cost;
    }
}

/// Persisted usage totals with per-provider, per-model and per-app breakdowns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UsageStats {
    pub total_requests: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub by_provider: BTreeMap<String, UsageBucket>,
    pub by_model: BTreeMap<String, UsageBucket>,
    pub by_app: BTreeMap<String, UsageBucket>,
    pub last_reset: Option<DateTime<Utc>>,
}

impl UsageStats {
    /// Zeroed stats stamped with the current time
    pub fn reset_now() -> Self {
        Self {
            last_reset: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Record one completed request against totals and every breakdown
    pub fn record(&mut self, provider: &str, model: &str, app_id: &str, tokens: u64, cost: f64) {
        self.total_requests += 1;
        self.total_tokens += tokens;
        self.total_cost += cost;

        self.by_provider
            .entry(provider.to_string())
            .or_default()
            .add(tokens, cost);
        self.by_model
            .entry(model.to_string())
            .or_default()
            .add(tokens, cost);
        self.by_app
            .entry(app_id.to_string())
            .or_default()
            .add(tokens, cost);
    }

    /// True when nothing has been recorded since the last reset
    pub fn is_empty(&self) -> bool {
        self.total_requests == 0
            && self.by_provider.is_empty()
            && self.by_model.is_empty()
            && self.by_app.is_empty()
    }
}
