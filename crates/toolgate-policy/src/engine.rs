use crate::catalog::ToolCatalog;
use crate::grants::SessionGrantStore;
use toolgate_core::{GrantedBy, PermissionDecision, RiskTier};

/// Combine risk classification and session grants into a decision.
///
/// Pure policy: no side effects, no audit writes. The coordinator audits the
/// eventual resolution exactly once.
pub fn evaluate(
    tool_id: &str,
    catalog: &ToolCatalog,
    grants: &SessionGrantStore,
) -> PermissionDecision {
    let tier = catalog.classify(tool_id);

    // Session grants short-circuit confirmation, but never for destructive
    // tools. Such grants cannot be created; the guard here is belt-and-braces.
    if tier != RiskTier::Destructive {
        if let Some(grant) = grants.check(tool_id) {
            if grant.always_allow {
                return PermissionDecision {
                    allowed: true,
                    requires_confirmation: false,
                    requires_explicit_approval: false,
                    tier,
                    warning_message: None,
                    granted_by: Some(GrantedBy::Session),
                };
            }
        }
    }

    match tier {
        RiskTier::Read => PermissionDecision {
            allowed: true,
            requires_confirmation: false,
            requires_explicit_approval: false,
            tier,
            warning_message: None,
            granted_by: Some(GrantedBy::Auto),
        },
        RiskTier::Write => PermissionDecision {
            allowed: true,
            requires_confirmation: true,
            requires_explicit_approval: false,
            tier,
            warning_message: None,
            granted_by: None,
        },
        RiskTier::Destructive => PermissionDecision {
            allowed: false,
            requires_confirmation: true,
            requires_explicit_approval: true,
            tier,
            warning_message: catalog.warning(tool_id).map(str::to_string),
            granted_by: None,
        },
    }
}
