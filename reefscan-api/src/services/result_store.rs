//! Result recording and retrieval
//!
//! [`ResultStore`] is the seam for a real datastore. The only implementation
//! here is [`InMemoryResultStore`]: process-lifetime, append-only, unbounded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reefscan_common::api::{AnalysisResult, DetectionOrigin};
use reefscan_common::{DetectionList, Result};
use tokio::sync::RwLock;

/// An analysis ready to be recorded; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewAnalysisResult {
    pub image_url: Option<String>,
    pub local_detections: DetectionList,
    pub external_detections: DetectionList,
    pub final_detections: DetectionList,
    pub source: DetectionOrigin,
    pub timestamp: DateTime<Utc>,
}

impl NewAnalysisResult {
    fn with_id(self, id: u64) -> AnalysisResult {
        AnalysisResult {
            id,
            image_url: self.image_url,
            local_detections: self.local_detections,
            external_detections: self.external_detections,
            final_detections: self.final_detections,
            source: self.source,
            timestamp: self.timestamp,
        }
    }
}

/// Append-only result storage
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Assign the next id (1-based, never reused) and append
    async fn append(&self, result: NewAnalysisResult) -> Result<AnalysisResult>;

    /// All results in insertion order
    async fn list_all(&self) -> Result<Vec<AnalysisResult>>;

    async fn count(&self) -> Result<usize> {
        Ok(self.list_all().await?.len())
    }
}

/// Results held in memory; lost on restart
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: RwLock<Vec<AnalysisResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn append(&self, result: NewAnalysisResult) -> Result<AnalysisResult> {
        // Id assignment and push under one guard; nothing is ever removed,
        // so len + 1 never repeats.
        let mut results = self.results.write().await;
        let recorded = result.with_id(results.len() as u64 + 1);
        results.push(recorded.clone());

        tracing::debug!(id = recorded.id, "Recorded analysis result");
        Ok(recorded)
    }

    async fn list_all(&self) -> Result<Vec<AnalysisResult>> {
        Ok(self.results.read().await.clone())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.results.read().await.len())
    }
}
