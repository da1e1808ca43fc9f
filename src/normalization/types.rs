use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ═══════════════════════════════════════════
// Wash
// ═══════════════════════════════════════════

/// Which step of the wash produced the canonical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WashTier {
    /// Blank input, returned untouched.
    Blank,
    /// Matched an entry scoped to the same inspection item.
    ItemMatch,
    /// Matched a category-wide fallback entry.
    CategoryMatch,
    /// No match; a new library entry was minted.
    NewEntry,
}

impl WashTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::ItemMatch => "item_match",
            Self::CategoryMatch => "category_match",
            Self::NewEntry => "new_entry",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WashOutcome {
    pub canonical: String,
    pub tier: WashTier,
    /// Library entry that was matched or created.
    pub entry_id: Option<Uuid>,
    /// Similarity of the winning candidate (matches only).
    pub score: Option<f64>,
    pub category: String,
}

// ═══════════════════════════════════════════
// Clusters
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub description: String,
    pub usage: i64,
}

/// Near-duplicate canonical phrases within one category.
/// Every pair of members meets the cluster threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub category: String,
    /// Ordered by usage desc, then description.
    pub members: Vec<ClusterMember>,
    pub total_usage: i64,
    pub suggested_canonical: String,
}

impl Cluster {
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.description.as_str())
    }
}

// ═══════════════════════════════════════════
// Merge / edit
// ═══════════════════════════════════════════

/// Result of an edit or merge. Everything but `Applied` is a soft failure
/// that left the database untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewriteOutcome {
    Applied { affected: usize },
    /// Old and new text are the same.
    Identical,
    /// No open defect carries the old text.
    NotFound,
    /// The new text is blank.
    BlankTarget,
    /// A library row with the new text already exists in a scope of the old
    /// text; renaming would break uniqueness.
    TargetExists,
}

impl RewriteOutcome {
    pub fn affected(&self) -> usize {
        match self {
            Self::Applied { affected } => *affected,
            _ => 0,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Operator-facing message.
    pub fn message(&self) -> String {
        match self {
            Self::Applied { affected } => format!("Updated {affected} open defect(s)"),
            Self::Identical => "Old and new descriptions are identical; nothing to do".into(),
            Self::NotFound => "No open defects found with that description".into(),
            Self::BlankTarget => "New description must not be blank".into(),
            Self::TargetExists => {
                "New description already exists in the library; merge instead".into()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberMerge {
    pub description: String,
    pub outcome: RewriteOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMergeReport {
    pub canonical: String,
    pub total_affected: usize,
    /// One entry per distinct non-canonical member, in input order.
    pub merges: Vec<MemberMerge>,
}
