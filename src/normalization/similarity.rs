//! Default similarity measure for defect phrases.

use similar::{DiffOp, TextDiff};

use super::traits::SimilarityMeasure;

/// Longest-common-block ratio over characters: `2·M / (|a| + |b|)` where `M`
/// is the number of characters in matching blocks of a minimal diff.
///
/// Symmetric, bounded to `[0, 1]`, and `1.0` only for identical input.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockRatio;

impl SimilarityMeasure for BlockRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let diff = TextDiff::from_chars(a, b);
        let total = diff.old_slices().len() + diff.new_slices().len();
        if total == 0 {
            return 1.0;
        }

        let matched: usize = diff
            .ops()
            .iter()
            .map(|op| match op {
                DiffOp::Equal { len, .. } => *len,
                _ => 0,
            })
            .sum();

        (2 * matched) as f64 / total as f64
    }
}

/// Comparison form of a description: trimmed and lower-cased.
pub fn normalize_for_match(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Trim and upper-case the first character; the rest is kept verbatim.
pub fn clean_description(text: &str) -> String {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
