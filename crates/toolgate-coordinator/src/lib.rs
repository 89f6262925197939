pub mod config;
pub mod coordinator;
pub mod events;
pub mod summary;

pub use config::GateConfig;
pub use coordinator::{ApprovalCoordinator, RequestState};
pub use events::{ApprovalPrompt, ApprovalResponse, ParamPreview};
pub use summary::summarize_params;
