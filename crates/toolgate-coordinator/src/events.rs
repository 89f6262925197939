use serde::{Deserialize, Serialize};
use toolgate_core::RiskTier;
use uuid::Uuid;

/// One truncated key/value pair from a tool call's parameters. Raw
/// parameters never cross the approver boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamPreview {
    pub key: String,
    pub truncated_value: String,
}

/// Outbound event asking the approver for a decision.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalPrompt {
    pub correlation_id: Uuid,
    pub tool: String,
    pub description: String,
    pub parameter_summary: Vec<ParamPreview>,
    pub tier: RiskTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
    /// Present only on destructive confirmation re-prompts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}

/// Inbound event from the approver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum ApprovalResponse {
    Approve {
        #[serde(default)]
        always_allow: bool,
        #[serde(default)]
        confirmation_text: Option<String>,
    },
    Deny,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserializes_wire_shape() {
        let approve: ApprovalResponse = serde_json::from_str(
            r#"{"decision": "approve", "always_allow": true}"#,
        )
        .unwrap();
        assert!(matches!(
            approve,
            ApprovalResponse::Approve {
                always_allow: true,
                confirmation_text: None
            }
        ));

        let deny: ApprovalResponse = serde_json::from_str(r#"{"decision": "deny"}"#).unwrap();
        assert!(matches!(deny, ApprovalResponse::Deny));
    }
}
