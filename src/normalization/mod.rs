//! Defect description normalization
//!
//! Keeps inspector free text aggregatable by mapping every raw description
//! onto a canonical phrase from a per-tenant library.
//!
//! ## Flow
//! ```text
//! raw text → wash (item tier → category tier → new entry) → defect.original_comment
//! library  → cluster (complete linkage) → operator review → merge / edit
//! ```
//!
//! ## Rules
//! - Raw text is never modified; only `original_comment` is rewritten.
//! - Merges and edits touch open defects only.
//! - Every write runs in one immediate transaction; nested calls join the
//!   caller's transaction.

pub mod error;
pub mod types;
pub mod traits;
pub mod similarity;
pub mod category;
pub mod wash;
pub mod cluster;
pub mod merge;
pub mod review;
pub mod seed;
pub mod defects;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::NormalizationError;
pub use types::*;
pub use traits::{CategoryResolver, SimilarityMeasure};
pub use similarity::BlockRatio;
pub use category::CategoryMap;
pub use wash::WashEngine;
pub use cluster::{compute_clusters, find_clusters};
pub use merge::{edit_description, merge_cluster, merge_descriptions};
pub use review::{overlong_descriptions, singleton_descriptions, vague_descriptions, VaguePatterns};
pub use seed::{load_seed_file, parse_seed_phrases, seed_library, SeedPhrase};
pub use defects::{count_open_with_text, get_defect, raise_defect, set_defect_status};
