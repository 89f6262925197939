use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use toolgate_core::{AuditRecord, DecisionKind};

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Chain integrity violation: {0}")]
    IntegrityViolation(String),
}

/// Filter for querying the ledger. All fields are conjunctive; `from`/`to`
/// bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub tool: Option<String>,
    pub decision_kind: Option<DecisionKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AuditQuery {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(tool) = &self.tool {
            if &record.tool != tool {
                return false;
            }
        }
        if let Some(kind) = self.decision_kind {
            if record.decision_kind != kind {
                return false;
            }
        }
        if let Some(from) = self.from {
            if record.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Append-only record of every permission decision.
///
/// `append` must make the record durable before returning Ok; a failed
/// append is always distinguishable from a successful one. `query` returns
/// records ordered by timestamp ascending, stable by insertion order for
/// equal timestamps.
#[async_trait]
pub trait AuditLedger: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError>;
}

/// Stable timestamp sort over records already in insertion order.
pub(crate) fn sort_by_timestamp(records: &mut [AuditRecord]) {
    records.sort_by_key(|r| r.timestamp);
}
