//! Mock audit store for testing.

use std::sync::Mutex;

use crate::audit::{AuditError, AuditFilter, AuditRecord, AuditStore};

/// In-memory audit store. `failing()` rejects every write.
#[derive(Debug, Default)]
pub struct MockAuditStore {
    records: Mutex<Vec<AuditRecord>>,
    fail_writes: bool,
}

impl MockAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_writes: true,
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn matching(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self
            .records
            .lock()
            .map_err(|_| AuditError::Database("mock store lock poisoned".to_string()))?;
        Ok(records
            .iter()
            .rev()
            .filter(|r| filter.user_id.map_or(true, |id| r.user_id == id))
            .filter(|r| {
                filter
                    .shortcut_story_id
                    .map_or(true, |id| r.shortcut_story_id == id)
            })
            .cloned()
            .collect())
    }
}

impl AuditStore for MockAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        if self.fail_writes {
            return Err(AuditError::Database("disk I/O error".to_string()));
        }
        let mut records = self
            .records
            .lock()
            .map_err(|_| AuditError::Database("mock store lock poisoned".to_string()))?;
        let id = records.len() as i64 + 1;
        let mut stored = record.clone();
        stored.id = id;
        records.push(stored);
        Ok(id)
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(self
            .matching(filter)?
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect())
    }

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError> {
        Ok(self.matching(filter)?.len() as i64)
    }
}
