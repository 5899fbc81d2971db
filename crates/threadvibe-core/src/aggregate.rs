//! Label frequency aggregation.

use std::collections::HashMap;

use crate::types::LabelDistribution;

/// Fold a sequence of predicted labels into a normalized frequency
/// distribution: each distinct label maps to `count / total`.
///
/// The result is empty for empty input — callers treat that as a
/// reportable condition rather than rendering an empty chart. For a
/// non-empty input the proportions sum to 1.0 (within floating
/// tolerance), and equal multisets of labels produce equal results
/// regardless of input order.
pub fn aggregate(labels: &[String]) -> LabelDistribution {
    if labels.is_empty() {
        return LabelDistribution::new();
    }

    let total = labels.len() as f64;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count as f64 / total))
        .collect()
}
