use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use toolgate_core::{RiskTier, ToolDefinition};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Duplicate tool id: {0}")]
    DuplicateTool(String),
    #[error("Destructive tool missing warning message: {0}")]
    MissingWarning(String),
}

/// Static registry mapping tool ids to risk tiers and warning text.
/// Loaded once at startup; never mutated at runtime.
pub struct ToolCatalog {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolCatalog {
    pub fn new(definitions: Vec<ToolDefinition>) -> Result<Self, CatalogError> {
        let mut tools = HashMap::new();
        for def in definitions {
            if def.tier == RiskTier::Destructive
                && def.warning_message.as_deref().unwrap_or("").trim().is_empty()
            {
                return Err(CatalogError::MissingWarning(def.id));
            }
            if tools.contains_key(&def.id) {
                return Err(CatalogError::DuplicateTool(def.id));
            }
            tools.insert(def.id.clone(), def);
        }
        Ok(Self { tools })
    }

    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<ToolDefinition> = serde_yaml::from_str(content)?;
        Self::new(definitions)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = tokio::fs::read_to_string(&path).await?;
        Self::from_yaml(&content)
    }

    /// Default catalog for the assistant tool set. Deployments normally load
    /// their own YAML; this keeps the gate usable out of the box.
    pub fn builtin() -> Self {
        let definitions = vec![
            ToolDefinition {
                id: "get_calendar_events".into(),
                description: "List calendar events in a date range".into(),
                tier: RiskTier::Read,
                warning_message: None,
            },
            ToolDefinition {
                id: "read_email".into(),
                description: "Read a message from the inbox".into(),
                tier: RiskTier::Read,
                warning_message: None,
            },
            ToolDefinition {
                id: "search_contacts".into(),
                description: "Search the contact list".into(),
                tier: RiskTier::Read,
                warning_message: None,
            },
            ToolDefinition {
                id: "send_email".into(),
                description: "Send an email on the user's behalf".into(),
                tier: RiskTier::Write,
                warning_message: None,
            },
            ToolDefinition {
                id: "create_calendar_event".into(),
                description: "Add an event to the calendar".into(),
                tier: RiskTier::Write,
                warning_message: None,
            },
            ToolDefinition {
                id: "update_contact".into(),
                description: "Edit an existing contact".into(),
                tier: RiskTier::Write,
                warning_message: None,
            },
            ToolDefinition {
                id: "delete_contact".into(),
                description: "Permanently delete a contact".into(),
                tier: RiskTier::Destructive,
                warning_message: Some(
                    "This permanently deletes the contact and cannot be undone.".into(),
                ),
            },
            ToolDefinition {
                id: "delete_calendar_event".into(),
                description: "Permanently delete a calendar event".into(),
                tier: RiskTier::Destructive,
                warning_message: Some(
                    "This permanently deletes the event and cannot be undone.".into(),
                ),
            },
        ];

        let mut tools = HashMap::new();
        for def in definitions {
            tools.insert(def.id.clone(), def);
        }
        Self { tools }
    }

    pub fn get(&self, tool_id: &str) -> Option<&ToolDefinition> {
        self.tools.get(tool_id)
    }

    /// Classify a tool by id. Unknown tools default to `Write`: they are
    /// never auto-executed and never blocked outright, only confirmed.
    pub fn classify(&self, tool_id: &str) -> RiskTier {
        self.tools.get(tool_id).map(|t| t.tier).unwrap_or(RiskTier::Write)
    }

    pub fn warning(&self, tool_id: &str) -> Option<&str> {
        self.tools.get(tool_id).and_then(|t| t.warning_message.as_deref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_tools() {
        let catalog = ToolCatalog::builtin();
        assert_eq!(catalog.classify("get_calendar_events"), RiskTier::Read);
        assert_eq!(catalog.classify("send_email"), RiskTier::Write);
        assert_eq!(catalog.classify("delete_contact"), RiskTier::Destructive);
    }

    #[test]
    fn test_unknown_tool_defaults_to_write() {
        let catalog = ToolCatalog::builtin();
        assert_eq!(catalog.classify("no_such_tool"), RiskTier::Write);
    }

    #[test]
    fn test_destructive_tools_carry_warnings() {
        let catalog = ToolCatalog::builtin();
        assert!(catalog.warning("delete_contact").is_some());
        assert!(catalog.warning("send_email").is_none());
    }

    #[test]
    fn test_destructive_without_warning_rejected() {
        let result = ToolCatalog::new(vec![ToolDefinition {
            id: "wipe_everything".into(),
            description: "bad entry".into(),
            tier: RiskTier::Destructive,
            warning_message: None,
        }]);
        assert!(matches!(result, Err(CatalogError::MissingWarning(_))));
    }

    #[test]
    fn test_blank_warning_rejected() {
        let result = ToolCatalog::new(vec![ToolDefinition {
            id: "wipe_everything".into(),
            description: "bad entry".into(),
            tier: RiskTier::Destructive,
            warning_message: Some("   ".into()),
        }]);
        assert!(matches!(result, Err(CatalogError::MissingWarning(_))));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let def = ToolDefinition {
            id: "send_email".into(),
            description: "send".into(),
            tier: RiskTier::Write,
            warning_message: None,
        };
        let result = ToolCatalog::new(vec![def.clone(), def]);
        assert!(matches!(result, Err(CatalogError::DuplicateTool(_))));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
- id: fetch_weather
  description: Fetch the weather forecast
  tier: read
- id: purge_history
  description: Remove all stored history
  tier: destructive
  warning_message: Removes all history permanently.
"#;
        let catalog = ToolCatalog::from_yaml(yaml).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.classify("fetch_weather"), RiskTier::Read);
        assert_eq!(catalog.classify("purge_history"), RiskTier::Destructive);
    }

    #[test]
    fn test_from_yaml_validates() {
        let yaml = r#"
- id: purge_history
  description: Remove all stored history
  tier: destructive
"#;
        assert!(matches!(
            ToolCatalog::from_yaml(yaml),
            Err(CatalogError::MissingWarning(_))
        ));
    }
}
