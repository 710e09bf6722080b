//! Detection types shared by the baseline source, the external classifier
//! and the reconciler.

use serde::{Deserialize, Serialize};

/// A single species identification with an associated count.
///
/// The derived `Ord` compares `species` first, then `count`. That total order
/// is what [`canonicalize`] sorts by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Detection {
    pub species: String,
    pub count: u32,
}

impl Detection {
    pub fn new(species: impl Into<String>, count: u32) -> Self {
        Self {
            species: species.into(),
            count,
        }
    }
}

/// Ordered sequence of detections. Order carries no meaning.
pub type DetectionList = Vec<Detection>;

/// Sorted copy of `detections`, used only for order-independent comparison.
pub fn canonicalize(detections: &[Detection]) -> DetectionList {
    let mut sorted = detections.to_vec();
    sorted.sort();
    sorted
}

/// True when both lists hold the same detections, ignoring order.
///
/// Duplicates count: `[a, a]` and `[a]` differ.
pub fn same_detections(a: &[Detection], b: &[Detection]) -> bool {
    a.len() == b.len() && canonicalize(a) == canonicalize(b)
}

/// Sum of all counts in the list
pub fn total_count(detections: &[Detection]) -> u64 {
    detections.iter().map(|d| u64::from(d.count)).sum()
}
