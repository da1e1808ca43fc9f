//! Seams between the engine and its collaborators.
//!
//! - SimilarityMeasure: fuzzy comparison shared by wash and clustering
//! - CategoryResolver: item template lookup owned by the inspection side

/// Symmetric string similarity bounded to `[0, 1]`.
///
/// Implementations must be monotonic in shared content: more common
/// material never lowers the score. Thresholds in `EngineConfig` are tuned
/// for a specific measure.
pub trait SimilarityMeasure: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Maps an inspection item to the category of its template.
pub trait CategoryResolver: Send + Sync {
    /// `None` when the item is unknown to the template store.
    fn category_for(&self, tenant_id: &str, item_id: &str) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe() {
        fn _assert_similarity(_: &dyn SimilarityMeasure) {}
        fn _assert_resolver(_: &dyn CategoryResolver) {}
    }
}
