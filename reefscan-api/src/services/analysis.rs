//! Per-request analysis flow
//!
//! baseline detections → external classification → reconcile → record.
//! Each step is awaited in order; nothing is carried between requests.

use chrono::Utc;
use reefscan_common::api::AnalysisResult;
use reefscan_common::detection::total_count;
use std::sync::Arc;
use tracing::info;

use super::classifier::ExternalClassifier;
use super::detection_source::DetectionSource;
use super::reconciler::{reconcile, Reconciliation};
use super::result_store::{NewAnalysisResult, ResultStore};
use crate::error::ApiResult;
use crate::models::ImageInput;

/// Wires the baseline source, the external classifier and the store
pub struct AnalysisService {
    baseline: Arc<dyn DetectionSource>,
    classifier: Arc<dyn ExternalClassifier>,
    store: Arc<dyn ResultStore>,
}

impl AnalysisService {
    pub fn new(
        baseline: Arc<dyn DetectionSource>,
        classifier: Arc<dyn ExternalClassifier>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            baseline,
            classifier,
            store,
        }
    }

    /// Process one image and record the outcome
    ///
    /// Nothing is recorded when either detection step fails.
    pub async fn analyze(&self, image: ImageInput) -> ApiResult<AnalysisResult> {
        let local_detections = self.baseline.detect(&image).await?;
        let external_detections = self.classifier.classify(&image).await?;

        let Reconciliation {
            final_detections,
            source,
        } = reconcile(&local_detections, &external_detections);

        let recorded = self
            .store
            .append(NewAnalysisResult {
                image_url: image.image_url().map(str::to_owned),
                local_detections,
                external_detections,
                final_detections,
                source,
                timestamp: Utc::now(),
            })
            .await?;

        info!(
            id = recorded.id,
            image = %image.describe(),
            baseline = self.baseline.name(),
            classifier = self.classifier.name(),
            source = %recorded.source,
            detections = recorded.final_detections.len(),
            individuals = total_count(&recorded.final_detections),
            "Analysis recorded"
        );

        Ok(recorded)
    }

    pub async fn list_results(&self) -> ApiResult<Vec<AnalysisResult>> {
        Ok(self.store.list_all().await?)
    }

    pub async fn results_recorded(&self) -> ApiResult<usize> {
        Ok(self.store.count().await?)
    }
}
