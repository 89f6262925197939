use parking_lot::Mutex;
use std::collections::HashMap;
use toolgate_core::{GateError, RiskTier, SessionGrant};
use tracing::{info, warn};

/// Process-lifetime store of "always allow" grants, keyed by tool id.
/// Explicitly volatile: cleared at construction so nothing survives a
/// restart, and never written to disk.
pub struct SessionGrantStore {
    grants: Mutex<HashMap<String, SessionGrant>>,
}

impl SessionGrantStore {
    pub fn new() -> Self {
        let store = Self {
            grants: Mutex::new(HashMap::new()),
        };
        store.clear_all();
        store
    }

    /// Record an always-allow grant. Destructive tools are rejected: no code
    /// path may ever create a grant for them.
    pub fn grant(&self, tool_id: &str, tier: RiskTier) -> Result<(), GateError> {
        if tier == RiskTier::Destructive {
            warn!("Rejected always-allow grant for destructive tool: {}", tool_id);
            return Err(GateError::InvalidGrantRequest(tool_id.to_string()));
        }

        let grant = SessionGrant {
            always_allow: true,
            granted_at: chrono::Utc::now(),
        };
        self.grants.lock().insert(tool_id.to_string(), grant);
        info!("Session grant stored for tool: {}", tool_id);
        Ok(())
    }

    pub fn check(&self, tool_id: &str) -> Option<SessionGrant> {
        self.grants.lock().get(tool_id).cloned()
    }

    pub fn clear_all(&self) {
        self.grants.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.grants.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.lock().is_empty()
    }
}

impl Default for SessionGrantStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_check() {
        let store = SessionGrantStore::new();
        store.grant("send_email", RiskTier::Write).unwrap();

        let grant = store.check("send_email").unwrap();
        assert!(grant.always_allow);
        assert!(store.check("read_email").is_none());
    }

    #[test]
    fn test_destructive_grant_rejected() {
        let store = SessionGrantStore::new();
        let result = store.grant("delete_contact", RiskTier::Destructive);
        assert!(matches!(result, Err(GateError::InvalidGrantRequest(_))));
        assert!(store.check("delete_contact").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_all_simulates_restart() {
        let store = SessionGrantStore::new();
        store.grant("send_email", RiskTier::Write).unwrap();
        store.grant("update_contact", RiskTier::Write).unwrap();
        assert_eq!(store.len(), 2);

        store.clear_all();
        assert!(store.check("send_email").is_none());
        assert!(store.check("update_contact").is_none());
    }
}
