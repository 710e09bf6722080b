//! Baseline vs. external detection reconciliation
//!
//! Agreement (same detections, any order) keeps the baseline list and marks
//! the result `local-model`. Any disagreement takes the external list and
//! marks it `external-ai`.
//!
//! NOTE: preferring the external reading on mismatch is a heuristic. Nothing
//! verifies that the external list is more accurate; a disagreement only
//! suggests the canned baseline does not describe this image. An empty
//! external list (e.g. an unparsable reply) also counts as disagreement.

use reefscan_common::api::DetectionOrigin;
use reefscan_common::detection::same_detections;
use reefscan_common::{Detection, DetectionList};

/// Outcome of reconciling one request's two lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub final_detections: DetectionList,
    pub source: DetectionOrigin,
}

pub fn reconcile(local: &[Detection], external: &[Detection]) -> Reconciliation {
    if same_detections(local, external) {
        Reconciliation {
            final_detections: local.to_vec(),
            source: DetectionOrigin::LocalModel,
        }
    } else {
        Reconciliation {
            final_detections: external.to_vec(),
            source: DetectionOrigin::ExternalAi,
        }
    }
}
