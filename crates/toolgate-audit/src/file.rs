use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use toolgate_core::AuditRecord;

use crate::ledger::{sort_by_timestamp, AuditError, AuditLedger, AuditQuery};

const GENESIS: &str = "genesis";

#[derive(Serialize, Deserialize, Clone)]
struct ChainedRecord {
    entry_hash: String,
    prev_hash: String,
    #[serde(flatten)]
    record: AuditRecord,
}

/// Durable JSONL ledger with a SHA-256 hash chain. Each line carries the
/// hash of the previous entry, so edits and deletions are detectable.
/// Appends are fsynced before Ok is returned.
pub struct FileLedger {
    log_path: PathBuf,
    file: Mutex<File>,
    last_hash: Mutex<String>,
}

impl FileLedger {
    pub fn new<P: AsRef<Path>>(log_path: P) -> Result<Self, AuditError> {
        let log_path = log_path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        // Verify any existing chain and recover its head.
        let last_hash = Self::verify_and_get_last_hash(&log_path)?;

        Ok(Self {
            log_path,
            file: Mutex::new(file),
            last_hash: Mutex::new(last_hash),
        })
    }

    pub fn verify_integrity(&self) -> Result<(), AuditError> {
        Self::verify_and_get_last_hash(&self.log_path)?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<AuditRecord>, AuditError> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let chained: ChainedRecord = serde_json::from_str(&line)?;
            records.push(chained.record);
        }

        Ok(records)
    }

    fn chain_hash(prev_hash: &str, record_json: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prev_hash);
        hasher.update(record_json);
        format!("{:x}", hasher.finalize())
    }

    fn verify_and_get_last_hash(log_path: &Path) -> Result<String, AuditError> {
        if !log_path.exists() {
            return Ok(GENESIS.to_string());
        }

        let file = File::open(log_path)?;
        let reader = BufReader::new(file);

        let mut prev_hash = GENESIS.to_string();
        let mut line_num = 0;

        for line in reader.lines() {
            line_num += 1;
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            let chained: ChainedRecord = serde_json::from_str(&line).map_err(|e| {
                AuditError::IntegrityViolation(format!("Line {}: Invalid JSON: {}", line_num, e))
            })?;

            if chained.prev_hash != prev_hash {
                return Err(AuditError::IntegrityViolation(format!(
                    "Line {}: Hash chain broken. Expected prev_hash '{}', got '{}'",
                    line_num, prev_hash, chained.prev_hash
                )));
            }

            let record_json = serde_json::to_string(&chained.record)?;
            let computed = Self::chain_hash(&prev_hash, &record_json);
            if computed != chained.entry_hash {
                return Err(AuditError::IntegrityViolation(format!(
                    "Line {}: Hash mismatch. Expected '{}', got '{}'",
                    line_num, computed, chained.entry_hash
                )));
            }

            prev_hash = chained.entry_hash;
        }

        Ok(prev_hash)
    }
}

#[async_trait]
impl AuditLedger for FileLedger {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        // The file lock is held for the whole append so concurrent writers
        // cannot interleave lines or fork the chain.
        let mut file = self.file.lock();

        let prev_hash = self.last_hash.lock().clone();
        let record_json = serde_json::to_string(record)?;
        let entry_hash = Self::chain_hash(&prev_hash, &record_json);

        let chained = ChainedRecord {
            entry_hash: entry_hash.clone(),
            prev_hash,
            record: record.clone(),
        };

        let json = serde_json::to_string(&chained)?;
        writeln!(file, "{}", json)?;
        file.sync_all()?;

        *self.last_hash.lock() = entry_hash;
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let _guard = self.file.lock();
        let mut matched: Vec<AuditRecord> = self
            .read_all()?
            .into_iter()
            .filter(|r| query.matches(r))
            .collect();
        sort_by_timestamp(&mut matched);
        Ok(matched)
    }
}
