use async_trait::async_trait;
use parking_lot::Mutex;
use toolgate_core::AuditRecord;

use crate::ledger::{sort_by_timestamp, AuditError, AuditLedger, AuditQuery};

/// Reference ledger for tests and single-process deployments. Records are
/// kept in insertion order.
pub struct MemoryLedger {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLedger for MemoryLedger {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let mut matched: Vec<AuditRecord> = self
            .records
            .lock()
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        sort_by_timestamp(&mut matched);
        Ok(matched)
    }
}
