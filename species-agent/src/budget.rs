//! Usage budget ledger.
//!
//! Tracks requests per day and spend per month in an injected key/value
//! [`CounterStore`]. Keys embed the date, so a new day or month starts from
//! zero without any reset step:
//!
//! - `usage:daily:YYYY-MM-DD` → request count
//! - `usage:monthly:YYYY-MM` → spend in USD
//!
//! Reads and writes are separate store operations. Concurrent recorders
//! can lose updates (last write wins); the ledger is advisory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::backend::Usage;

/// Key/value storage for usage counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value, `None` when the key was never written.
    async fn get(&self, key: &str) -> Option<f64>;

    /// Overwrite a value.
    async fn set(&self, key: &str, value: f64);
}

/// In-process counter store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    values: Arc<RwLock<HashMap<String, f64>>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Option<f64> {
        self.values.read().await.get(key).copied()
    }

    async fn set(&self, key: &str, value: f64) {
        self.values.write().await.insert(key.to_string(), value);
    }
}

/// Store key for a day's request count.
pub fn day_key(date: NaiveDate) -> String {
    format!("usage:daily:{}", date.format("%Y-%m-%d"))
}

/// Store key for a month's spend.
pub fn month_key(date: NaiveDate) -> String {
    format!("usage:monthly:{}", date.format("%Y-%m"))
}

/// Converts token usage into USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub input_usd_per_million: f64,
    pub output_usd_per_million: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            input_usd_per_million: 3.0,
            output_usd_per_million: 15.0,
        }
    }
}

impl CostModel {
    pub fn cost(&self, usage: &Usage) -> f64 {
        (usage.prompt_tokens as f64 * self.input_usd_per_million
            + usage.completion_tokens as f64 * self.output_usd_per_million)
            / 1_000_000.0
    }
}

/// Configured limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimits {
    pub daily_requests: u32,
    pub monthly_budget_usd: f64,
    /// Percentages of the monthly budget that raise an alert when crossed
    pub alert_thresholds: Vec<u8>,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            daily_requests: 100,
            monthly_budget_usd: 50.0,
            alert_thresholds: vec![50, 75, 90],
        }
    }
}

/// Why the budget refuses another request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BudgetError {
    #[error("Daily request limit of {limit} reached")]
    DailyLimitReached { limit: u32 },

    #[error("Monthly budget exhausted: ${spent:.2} of ${budget:.2}")]
    MonthlyBudgetExhausted { spent: f64, budget: f64 },
}

/// A threshold crossed by the latest recorded call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlert {
    pub threshold: u8,
    pub message: String,
}

/// Budget snapshot plus limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub day_key: String,
    pub month_key: String,
    pub daily_count: u32,
    pub monthly_spend: f64,
    pub daily_limit: u32,
    pub monthly_budget: f64,
    pub budget_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<BudgetAlert>,
}

impl BudgetStatus {
    pub fn is_exhausted(&self) -> bool {
        self.daily_count >= self.daily_limit || self.monthly_spend >= self.monthly_budget
    }
}

/// Spend report, logged and echoed by the notification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct BudgetNotification {
    pub timestamp: DateTime<Utc>,
    pub current_spend: f64,
    pub budget_percent: f64,
    pub monthly_budget: f64,
    pub message: String,
}

impl BudgetNotification {
    pub fn new(current_spend: f64, budget_percent: f64, monthly_budget: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            current_spend,
            budget_percent,
            monthly_budget,
            message: format_alert(current_spend, budget_percent, monthly_budget),
        }
    }
}

fn format_alert(spend: f64, percent: f64, budget: f64) -> String {
    format!(
        "Species Intelligence Research Agent has used {:.0}% of monthly budget (${:.2} of ${:.2})",
        percent, spend, budget
    )
}

fn percent_of(spend: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        spend / budget * 100.0
    } else {
        100.0
    }
}

/// Daily/monthly usage ledger.
pub struct UsageLedger {
    store: Arc<dyn CounterStore>,
    limits: BudgetLimits,
    cost_model: CostModel,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn CounterStore>, limits: BudgetLimits) -> Self {
        Self {
            store,
            limits,
            cost_model: CostModel::default(),
        }
    }

    /// Ledger over a fresh in-memory store.
    pub fn in_memory(limits: BudgetLimits) -> Self {
        Self::new(Arc::new(MemoryCounterStore::new()), limits)
    }

    pub fn limits(&self) -> &BudgetLimits {
        &self.limits
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Current usage for the day and month containing `today`.
    pub async fn status(&self, today: NaiveDate) -> BudgetStatus {
        let day_key = day_key(today);
        let month_key = month_key(today);
        let daily_count = self.store.get(&day_key).await.unwrap_or(0.0).max(0.0) as u32;
        let monthly_spend = self.store.get(&month_key).await.unwrap_or(0.0).max(0.0);

        BudgetStatus {
            day_key,
            month_key,
            daily_count,
            monthly_spend,
            daily_limit: self.limits.daily_requests,
            monthly_budget: self.limits.monthly_budget_usd,
            budget_percent: percent_of(monthly_spend, self.limits.monthly_budget_usd),
            alert: None,
        }
    }

    /// Fail when another request would exceed a limit.
    pub async fn check(&self, today: NaiveDate) -> Result<BudgetStatus, BudgetError> {
        let status = self.status(today).await;

        if status.daily_count >= status.daily_limit {
            return Err(BudgetError::DailyLimitReached {
                limit: status.daily_limit,
            });
        }
        if status.monthly_spend >= status.monthly_budget {
            return Err(BudgetError::MonthlyBudgetExhausted {
                spent: status.monthly_spend,
                budget: status.monthly_budget,
            });
        }

        Ok(status)
    }

    /// Count one request and add its cost.
    ///
    /// The returned status carries an alert when this call pushed monthly
    /// spend across a configured threshold.
    pub async fn record(&self, today: NaiveDate, cost_usd: f64) -> BudgetStatus {
        let before = self.status(today).await;

        let daily_count = before.daily_count.saturating_add(1);
        let monthly_spend = before.monthly_spend + cost_usd.max(0.0);

        self.store.set(&before.day_key, daily_count as f64).await;
        self.store.set(&before.month_key, monthly_spend).await;

        let budget_percent = percent_of(monthly_spend, before.monthly_budget);
        let alert = self
            .limits
            .alert_thresholds
            .iter()
            .copied()
            .filter(|t| before.budget_percent < *t as f64 && budget_percent >= *t as f64)
            .max()
            .map(|threshold| BudgetAlert {
                threshold,
                message: format_alert(monthly_spend, budget_percent, before.monthly_budget),
            });

        if let Some(alert) = &alert {
            warn!(
                threshold = alert.threshold,
                monthly_spend,
                monthly_budget = before.monthly_budget,
                "Budget alert: {}",
                alert.message
            );
        } else {
            info!(daily_count, monthly_spend, "Usage recorded");
        }

        BudgetStatus {
            daily_count,
            monthly_spend,
            budget_percent,
            alert,
            ..before
        }
    }
}
