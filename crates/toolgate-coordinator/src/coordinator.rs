use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use toolgate_audit::AuditLedger;
use toolgate_core::{AuditRecord, DecisionKind, FinalDecision, GateError, RiskTier};
use toolgate_policy::{evaluate, SessionGrantStore, ToolCatalog};

use crate::config::GateConfig;
use crate::events::{ApprovalPrompt, ApprovalResponse, ParamPreview};
use crate::summary::summarize_params;

/// Where a pending request sits in its lifecycle. Auto-resolved calls never
/// enter the pending table; terminal states remove the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    AwaitingUser,
    AwaitingConfirmationText,
}

/// Signal delivered to the suspended caller. Whoever removes a pending
/// entry sends exactly one of these.
enum Resolution {
    Approved { always_allow: bool },
    Denied { reason: String },
    Cancelled,
}

struct PendingRequest {
    tool: String,
    tier: RiskTier,
    state: RequestState,
    attempts: u32,
    created_at: DateTime<Utc>,
    signal_tx: mpsc::Sender<Resolution>,
}

/// What `respond` must do once the pending-table lock is released.
enum ResponseAction {
    Resolve(mpsc::Sender<Resolution>, Resolution),
    Reprompt(ApprovalPrompt, mpsc::Sender<Resolution>),
}

/// Stateful orchestration of the admission workflow: evaluate, suspend on
/// confirmation, apply the destructive two-step rule, update session grants,
/// and write exactly one audit record per terminal resolution.
pub struct ApprovalCoordinator {
    catalog: Arc<ToolCatalog>,
    grants: SessionGrantStore,
    ledger: Arc<dyn AuditLedger>,
    config: GateConfig,
    pending: Mutex<HashMap<Uuid, PendingRequest>>,
    prompt_tx: mpsc::Sender<ApprovalPrompt>,
}

impl ApprovalCoordinator {
    /// Returns the coordinator and the receiving end of the outbound
    /// approval-prompt channel, to be wired to the approver UI.
    pub fn new(
        catalog: Arc<ToolCatalog>,
        ledger: Arc<dyn AuditLedger>,
        config: GateConfig,
    ) -> (Self, mpsc::Receiver<ApprovalPrompt>) {
        let (prompt_tx, prompt_rx) = mpsc::channel(config.prompt_buffer);
        let coordinator = Self {
            catalog,
            // Fresh store per process: no grant survives a restart.
            grants: SessionGrantStore::new(),
            ledger,
            config,
            pending: Mutex::new(HashMap::new()),
            prompt_tx,
        };
        (coordinator, prompt_rx)
    }

    pub fn session_grants(&self) -> &SessionGrantStore {
        &self.grants
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn request_state(&self, correlation_id: Uuid) -> Option<RequestState> {
        self.pending.lock().get(&correlation_id).map(|e| e.state)
    }

    /// Single public entry point the execution engine calls before running a
    /// tool. Suspends until resolution when confirmation is required. Only
    /// an audit-write failure is surfaced as `Err`; every other outcome is a
    /// `FinalDecision` with a reason.
    pub async fn request_permission(
        &self,
        tool_id: &str,
        params: HashMap<String, Value>,
    ) -> Result<FinalDecision, GateError> {
        let decision = evaluate(tool_id, &self.catalog, &self.grants);
        let summary = summarize_params(
            &params,
            self.config.summary_max_fields,
            self.config.summary_max_value_len,
        );
        let context = render_context(&summary);

        if !decision.requires_confirmation {
            info!(
                "Auto-allowing tool: {} (tier {:?}, granted by {:?})",
                tool_id, decision.tier, decision.granted_by
            );
            self.write_audit(tool_id, DecisionKind::AutoAllowed, false, &context)
                .await?;
            return Ok(FinalDecision::allow());
        }

        let correlation_id = Uuid::new_v4();
        let (signal_tx, mut signal_rx) = mpsc::channel(4);
        self.pending.lock().insert(
            correlation_id,
            PendingRequest {
                tool: tool_id.to_string(),
                tier: decision.tier,
                state: RequestState::AwaitingUser,
                attempts: 0,
                created_at: Utc::now(),
                signal_tx,
            },
        );

        let prompt = ApprovalPrompt {
            correlation_id,
            tool: tool_id.to_string(),
            description: self
                .catalog
                .get(tool_id)
                .map(|t| t.description.clone())
                .unwrap_or_default(),
            parameter_summary: summary,
            tier: decision.tier,
            warning_message: decision.warning_message.clone(),
            attempts_remaining: None,
        };

        info!(
            "Awaiting approval for tool: {} (correlation id {})",
            tool_id, correlation_id
        );
        if self.prompt_tx.send(prompt).await.is_err() {
            self.pending.lock().remove(&correlation_id);
            warn!("Approval channel closed; denying tool: {}", tool_id);
            self.write_audit(tool_id, DecisionKind::Denied, false, &context)
                .await?;
            return Ok(FinalDecision::deny("approval channel closed"));
        }

        let resolution = match timeout(self.config.approval_timeout, signal_rx.recv()).await {
            Ok(Some(resolution)) => Some(resolution),
            Ok(None) => None,
            Err(_) => {
                // First resolution wins: if a decision raced the timeout and
                // already removed the entry, its signal is honored.
                if self.pending.lock().remove(&correlation_id).is_some() {
                    warn!(
                        "Approval timed out for tool: {} after {:?}",
                        tool_id, self.config.approval_timeout
                    );
                    let reason = format!(
                        "no approval received within {}s",
                        self.config.approval_timeout.as_secs()
                    );
                    self.write_audit(tool_id, DecisionKind::TimedOut, false, &context)
                        .await?;
                    return Ok(FinalDecision::deny(reason));
                }
                signal_rx.recv().await
            }
        };

        let (kind, final_decision, always_allowed) = match resolution {
            Some(Resolution::Approved { always_allow }) => {
                (DecisionKind::Approved, FinalDecision::allow(), always_allow)
            }
            Some(Resolution::Denied { reason }) => {
                (DecisionKind::Denied, FinalDecision::deny(reason), false)
            }
            Some(Resolution::Cancelled) => (
                DecisionKind::Denied,
                FinalDecision::deny("cancelled before a decision was made"),
                false,
            ),
            None => (
                DecisionKind::Denied,
                FinalDecision::deny("approval request dropped"),
                false,
            ),
        };

        self.write_audit(tool_id, kind, always_allowed, &context)
            .await?;

        // Grants are recorded only for audited approvals; an approval that
        // never reached the ledger must not change session policy.
        if always_allowed {
            self.grants.grant(tool_id, decision.tier)?;
        }

        info!(
            "Resolved tool: {} as {:?} (correlation id {})",
            tool_id, kind, correlation_id
        );
        Ok(final_decision)
    }

    /// Resolution entry point for the approver. Rejects late or duplicate
    /// decisions with `UnknownCorrelation`, and always-allow on a
    /// destructive tool with `InvalidGrantRequest` (the request then stays
    /// pending for a compliant decision).
    pub async fn respond(
        &self,
        correlation_id: Uuid,
        response: ApprovalResponse,
    ) -> Result<(), GateError> {
        let action = {
            let mut pending = self.pending.lock();
            let mut entry = pending
                .remove(&correlation_id)
                .ok_or(GateError::UnknownCorrelation(correlation_id))?;

            match response {
                ApprovalResponse::Deny => ResponseAction::Resolve(
                    entry.signal_tx.clone(),
                    Resolution::Denied {
                        reason: "denied by user".to_string(),
                    },
                ),
                ApprovalResponse::Approve {
                    always_allow,
                    confirmation_text,
                } => {
                    if entry.tier == RiskTier::Destructive {
                        if always_allow {
                            let tool = entry.tool.clone();
                            pending.insert(correlation_id, entry);
                            warn!(
                                "Rejected always-allow for destructive tool: {} (correlation id {})",
                                tool, correlation_id
                            );
                            return Err(GateError::InvalidGrantRequest(tool));
                        }
                        match confirmation_text.as_deref() {
                            Some(text) if text == entry.tool => ResponseAction::Resolve(
                                entry.signal_tx.clone(),
                                Resolution::Approved { always_allow: false },
                            ),
                            // The initial approve signal transitions to the
                            // confirmation-text stage without consuming an
                            // attempt; only mismatched text counts.
                            None if entry.state == RequestState::AwaitingUser => {
                                entry.state = RequestState::AwaitingConfirmationText;
                                let prompt = self.confirmation_prompt(correlation_id, &entry);
                                let signal_tx = entry.signal_tx.clone();
                                pending.insert(correlation_id, entry);
                                ResponseAction::Reprompt(prompt, signal_tx)
                            }
                            _ => {
                                entry.attempts += 1;
                                if entry.attempts >= self.config.max_confirmation_attempts {
                                    ResponseAction::Resolve(
                                        entry.signal_tx.clone(),
                                        Resolution::Denied {
                                            reason: format!(
                                                "confirmation text did not match after {} attempts",
                                                entry.attempts
                                            ),
                                        },
                                    )
                                } else {
                                    entry.state = RequestState::AwaitingConfirmationText;
                                    let prompt = self.confirmation_prompt(correlation_id, &entry);
                                    let signal_tx = entry.signal_tx.clone();
                                    pending.insert(correlation_id, entry);
                                    ResponseAction::Reprompt(prompt, signal_tx)
                                }
                            }
                        }
                    } else {
                        ResponseAction::Resolve(
                            entry.signal_tx.clone(),
                            Resolution::Approved { always_allow },
                        )
                    }
                }
            }
        };

        match action {
            ResponseAction::Resolve(signal_tx, resolution) => {
                // A send to a caller that timed out concurrently is dropped;
                // the timeout already resolved the request.
                let _ = signal_tx.send(resolution).await;
                Ok(())
            }
            ResponseAction::Reprompt(prompt, signal_tx) => {
                warn!(
                    "Requesting destructive confirmation text for correlation id {}",
                    correlation_id
                );
                if self.prompt_tx.send(prompt).await.is_err() {
                    if self.pending.lock().remove(&correlation_id).is_some() {
                        let _ = signal_tx
                            .send(Resolution::Denied {
                                reason: "approval channel closed".to_string(),
                            })
                            .await;
                    }
                }
                Ok(())
            }
        }
    }

    /// Deny a single pending request because its owning run was cancelled.
    /// The resolution is audited by the resumed caller; never silent.
    pub async fn cancel(&self, correlation_id: Uuid) -> Result<(), GateError> {
        let entry = self
            .pending
            .lock()
            .remove(&correlation_id)
            .ok_or(GateError::UnknownCorrelation(correlation_id))?;
        warn!(
            "Cancelled approval for tool: {} (pending since {})",
            entry.tool, entry.created_at
        );
        let _ = entry.signal_tx.send(Resolution::Cancelled).await;
        Ok(())
    }

    /// Deny every pending request, e.g. on session shutdown.
    pub async fn cancel_all(&self) {
        let entries: Vec<PendingRequest> =
            self.pending.lock().drain().map(|(_, entry)| entry).collect();
        for entry in entries {
            warn!(
                "Cancelled approval for tool: {} (pending since {})",
                entry.tool, entry.created_at
            );
            let _ = entry.signal_tx.send(Resolution::Cancelled).await;
        }
    }

    fn confirmation_prompt(&self, correlation_id: Uuid, entry: &PendingRequest) -> ApprovalPrompt {
        ApprovalPrompt {
            correlation_id,
            tool: entry.tool.clone(),
            description: format!(
                "Type the tool name '{}' exactly to confirm this destructive action",
                entry.tool
            ),
            parameter_summary: Vec::new(),
            tier: entry.tier,
            warning_message: self.catalog.warning(&entry.tool).map(str::to_string),
            attempts_remaining: Some(
                self.config
                    .max_confirmation_attempts
                    .saturating_sub(entry.attempts),
            ),
        }
    }

    /// Audit failures fail the request closed: the tool call is denied even
    /// if the user approved, and the gap is surfaced to the caller and logs.
    async fn write_audit(
        &self,
        tool: &str,
        kind: DecisionKind,
        always_allowed: bool,
        context: &str,
    ) -> Result<(), GateError> {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            tool: tool.to_string(),
            decision_kind: kind,
            always_allowed,
            context: context.to_string(),
            timestamp: Utc::now(),
        };
        self.ledger.append(&record).await.map_err(|e| {
            error!("Audit write failed for tool: {}: {}; failing closed", tool, e);
            GateError::AuditWriteFailure(e.to_string())
        })
    }
}

fn render_context(summary: &[ParamPreview]) -> String {
    if summary.is_empty() {
        return "no parameters".to_string();
    }
    summary
        .iter()
        .map(|p| format!("{}={}", p.key, p.truncated_value))
        .collect::<Vec<_>>()
        .join(", ")
}
