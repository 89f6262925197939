pub mod file;
pub mod ledger;
pub mod memory;

pub use file::FileLedger;
pub use ledger::{AuditError, AuditLedger, AuditQuery};
pub use memory::MemoryLedger;
