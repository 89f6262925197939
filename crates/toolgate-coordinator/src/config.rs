use std::time::Duration;

/// Tunables for the approval workflow. Defaults are conservative: a stuck
/// approval denies after ten minutes, and destructive confirmation text may
/// be retried three times before the request is denied.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub approval_timeout: Duration,
    pub max_confirmation_attempts: u32,
    pub summary_max_fields: usize,
    pub summary_max_value_len: usize,
    pub prompt_buffer: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            approval_timeout: Duration::from_secs(600),
            max_confirmation_attempts: 3,
            summary_max_fields: 8,
            summary_max_value_len: 120,
            prompt_buffer: 32,
        }
    }
}
