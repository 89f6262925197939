use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Blast-radius classification of a tool. Ordered by increasing caution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Read,
    Write,
    Destructive,
}

/// Static catalog entry for a single tool. Loaded once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub id: String,
    pub description: String,
    pub tier: RiskTier,
    /// Required for destructive tools; catalog validation enforces this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantedBy {
    Auto,
    Session,
    User,
}

/// Outcome of a single policy evaluation. Transient: never persisted as-is,
/// only the eventual resolution is audited.
#[derive(Debug, Clone)]
pub struct PermissionDecision {
    pub allowed: bool,
    pub requires_confirmation: bool,
    pub requires_explicit_approval: bool,
    pub tier: RiskTier,
    pub warning_message: Option<String>,
    pub granted_by: Option<GrantedBy>,
}

/// A volatile "always allow" decision for one tool. The whole store is
/// discarded on restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGrant {
    pub always_allow: bool,
    pub granted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Approved,
    Denied,
    AutoAllowed,
    TimedOut,
}

/// Append-only audit entry. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub tool: String,
    pub decision_kind: DecisionKind,
    pub always_allowed: bool,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

/// What the calling execution engine gets back. Denials always carry a
/// human-readable reason, never a bare boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl FinalDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}
