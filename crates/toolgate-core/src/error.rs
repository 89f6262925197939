use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("always-allow is not available for destructive tool: {0}")]
    InvalidGrantRequest(String),

    #[error("no pending approval request for correlation id: {0}")]
    UnknownCorrelation(Uuid),

    #[error("audit write failed: {0}")]
    AuditWriteFailure(String),
}
