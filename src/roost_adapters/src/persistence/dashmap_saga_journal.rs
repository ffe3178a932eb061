use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use roost_core::{SagaJournal, SagaJournalError, SagaRecord, UserId};

/// In-memory journal for tests and local runs. Lost on restart.
#[derive(Default, Clone)]
pub struct DashMapSagaJournal {
    sagas: Arc<DashMap<UserId, SagaRecord>>,
}

impl DashMapSagaJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, saga_id: &UserId) -> Option<SagaRecord> {
        self.sagas.get(saga_id).map(|entry| entry.value().clone())
    }
}

#[async_trait::async_trait]
impl SagaJournal for DashMapSagaJournal {
    async fn record(&self, record: &SagaRecord) -> Result<(), SagaJournalError> {
        self.sagas.insert(record.saga_id, record.clone());
        Ok(())
    }

    async fn incomplete(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SagaRecord>, SagaJournalError> {
        let mut records: Vec<SagaRecord> = self
            .sagas
            .iter()
            .filter(|entry| !entry.state.is_terminal() && entry.updated_at <= cutoff)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.updated_at);
        Ok(records)
    }
}
