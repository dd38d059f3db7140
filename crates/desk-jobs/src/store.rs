//! Concurrent job registry
//!
//! The authoritative owner of job records. One writer (the job's own
//! execution task) and many readers per record; every mutation happens
//! under a single write guard, so a reader never observes a record
//! mid-update. Reads return clones.

use chrono::Utc;
use desk_core::{AnalysisRequest, Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::record::{JobId, JobRecord, JobStatus, StatusSummary};

/// In-memory job registry, safe for concurrent access
///
/// Process-local by design: a restart loses all records.
#[derive(Default)]
pub struct JobStore {
    records: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new queued record and return its id
    pub async fn create(&self, request: AnalysisRequest) -> JobId {
        let id = JobId::generate();
        let record = JobRecord::new(id.clone(), request);
        let mut records = self.records.write().await;
        records.insert(id.clone(), record);
        debug!(job_id = %id, "job record created");
        id
    }

    /// Snapshot of a record
    pub async fn get(&self, id: &JobId) -> Result<JobRecord> {
        let records = self.records.read().await;
        records
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Status view of a record
    pub async fn status(&self, id: &JobId) -> Result<StatusSummary> {
        let records = self.records.read().await;
        records
            .get(id)
            .map(StatusSummary::from)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Move a record to Running, stamping `started_at`
    pub async fn mark_running(&self, id: &JobId) -> Result<()> {
        self.transition(id, JobStatus::Running, |record| {
            record.started_at = Some(Utc::now());
        })
        .await
    }

    /// Move a record to Completed with its result body
    pub async fn mark_completed(&self, id: &JobId, result: Value) -> Result<()> {
        self.transition(id, JobStatus::Completed, |record| {
            record.completed_at = Some(Utc::now());
            record.result = Some(result);
        })
        .await
    }

    /// Move a record to Failed with its error text
    pub async fn mark_failed(&self, id: &JobId, error: String) -> Result<()> {
        self.transition(id, JobStatus::Failed, |record| {
            record.completed_at = Some(Utc::now());
            record.error = Some(error);
        })
        .await
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Atomically apply a permitted status change plus associated fields
    async fn transition(
        &self,
        id: &JobId,
        next: JobStatus,
        apply: impl FnOnce(&mut JobRecord),
    ) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if !record.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: record.status.to_string(),
                to: next.to_string(),
            });
        }

        record.status = next;
        apply(record);
        debug!(job_id = %id, status = %next, "job transitioned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn request(symbol: &str) -> AnalysisRequest {
        AnalysisRequest::new(symbol, "US")
    }

    #[tokio::test]
    async fn test_create_starts_queued() {
        let store = JobStore::new();
        let id = store.create(request("AAPL")).await;

        let record = store.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Queued);
        assert!(record.started_at.is_none());
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn test_ids_are_unique_across_creates() {
        let store = JobStore::new();
        let a = store.create(request("AAPL")).await;
        let b = store.create(request("MSFT")).await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_get_unknown_id_not_found() {
        let store = JobStore::new();
        let result = store.get(&JobId::from("analysis_missing")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        let result = store.status(&JobId::from("analysis_missing")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_happy_path_transitions_stamp_timestamps() {
        let store = JobStore::new();
        let id = store.create(request("AAPL")).await;

        store.mark_running(&id).await.unwrap();
        let record = store.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Running);
        assert!(record.started_at.is_some());
        assert!(record.completed_at.is_none());

        store
            .mark_completed(&id, json!({"action": "BUY"}))
            .await
            .unwrap();
        let record = store.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert!(record.completed_at.is_some());
        assert_eq!(record.result, Some(json!({"action": "BUY"})));
    }

    #[tokio::test]
    async fn test_failed_path_records_error() {
        let store = JobStore::new();
        let id = store.create(request("AAPL")).await;
        store.mark_running(&id).await.unwrap();
        store.mark_failed(&id, "boom".to_string()).await.unwrap();

        let record = store.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn test_terminal_states_reject_transitions() {
        let store = JobStore::new();
        let id = store.create(request("AAPL")).await;
        store.mark_running(&id).await.unwrap();
        store.mark_completed(&id, json!({})).await.unwrap();

        assert!(matches!(
            store.mark_running(&id).await,
            Err(Error::InvalidTransition { .. })
        ));
        assert!(matches!(
            store.mark_failed(&id, "late".to_string()).await,
            Err(Error::InvalidTransition { .. })
        ));

        // Record unchanged by the rejected transitions
        let record = store.get(&id).await.unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_queued_cannot_jump_to_terminal() {
        let store = JobStore::new();
        let id = store.create(request("AAPL")).await;
        assert!(matches!(
            store.mark_completed(&id, json!({})).await,
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_jobs_keep_their_own_fields() {
        let store = Arc::new(JobStore::new());
        let symbols = ["AAPL", "MSFT", "NVDA", "AMZN", "TSLA"];

        let mut handles = Vec::new();
        for symbol in symbols {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let id = store.create(request(symbol)).await;
                store.mark_running(&id).await.unwrap();
                store
                    .mark_completed(&id, json!({"symbol": symbol}))
                    .await
                    .unwrap();
                id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        assert_eq!(store.len().await, symbols.len());
        for (id, symbol) in ids.iter().zip(symbols) {
            let record = store.get(id).await.unwrap();
            assert_eq!(record.request.symbol, symbol);
            assert_eq!(record.result, Some(json!({"symbol": symbol})));
        }
    }
}
