use std::collections::HashMap;

use super::traits::CategoryResolver;

/// In-memory item → category mapping, keyed per tenant.
///
/// Used when templates are loaded up front rather than queried per wash.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    categories: HashMap<(String, String), String>,
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        tenant_id: impl Into<String>,
        item_id: impl Into<String>,
        category: impl Into<String>,
    ) {
        self.categories
            .insert((tenant_id.into(), item_id.into()), category.into());
    }

    pub fn with(
        mut self,
        tenant_id: impl Into<String>,
        item_id: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        self.insert(tenant_id, item_id, category);
        self
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl CategoryResolver for CategoryMap {
    fn category_for(&self, tenant_id: &str, item_id: &str) -> Option<String> {
        self.categories
            .get(&(tenant_id.to_string(), item_id.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_item() {
        let map = CategoryMap::new().with("t1", "item-1", "Wet Area");
        assert_eq!(map.category_for("t1", "item-1").as_deref(), Some("Wet Area"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn unknown_item_or_tenant_is_none() {
        let map = CategoryMap::new().with("t1", "item-1", "Wet Area");
        assert!(map.category_for("t1", "item-2").is_none());
        assert!(map.category_for("t2", "item-1").is_none());
        assert!(CategoryMap::new().is_empty());
    }
}
