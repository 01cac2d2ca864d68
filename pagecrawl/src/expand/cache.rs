use crate::pages::{PageId, PageTree};
use std::collections::HashMap;

/// Memoized tree walks and exclusion sets.
///
/// Owned by the caller and passed to every expansion; results stay valid
/// for as long as the page tree does not change, so drop the cache (or
/// call [`ExpansionCache::clear`]) when it does.
#[derive(Debug, Clone, Default)]
pub struct ExpansionCache {
    excludes: HashMap<String, Vec<PageId>>,
    trees: HashMap<(PageId, u32), Vec<PageId>>,
}

impl ExpansionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descendants of `root` within `depth`, walking the tree only once
    /// per (root, depth).
    pub fn descendants(
        &mut self,
        pages: &dyn PageTree,
        root: PageId,
        depth: u32,
    ) -> Vec<PageId> {
        if let Some(ids) = self.trees.get(&(root, depth)) {
            tracing::trace!(root, depth, "tree cache hit");
            return ids.clone();
        }
        let ids = pages.descendant_ids(root, depth);
        self.trees.insert((root, depth), ids.clone());
        ids
    }

    pub(crate) fn exclusion(&self, list: &str) -> Option<&Vec<PageId>> {
        self.excludes.get(list)
    }

    pub(crate) fn store_exclusion(&mut self, list: &str, ids: Vec<PageId>) {
        self.excludes.insert(list.to_string(), ids);
    }

    pub fn tree_entries(&self) -> usize {
        self.trees.len()
    }

    pub fn exclusion_entries(&self) -> usize {
        self.excludes.len()
    }

    pub fn clear(&mut self) {
        self.excludes.clear();
        self.trees.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTree {
        walks: AtomicUsize,
    }

    impl PageTree for CountingTree {
        fn descendant_ids(&self, root: PageId, depth: u32) -> Vec<PageId> {
            self.walks.fetch_add(1, Ordering::SeqCst);
            (1..=i64::from(depth)).map(|i| root * 10 + i).collect()
        }
    }

    #[test]
    fn test_descendants_are_memoized() {
        let tree = CountingTree::default();
        let mut cache = ExpansionCache::new();

        assert_eq!(cache.descendants(&tree, 5, 2), vec![51, 52]);
        assert_eq!(cache.descendants(&tree, 5, 2), vec![51, 52]);
        assert_eq!(tree.walks.load(Ordering::SeqCst), 1);

        cache.descendants(&tree, 5, 3);
        assert_eq!(tree.walks.load(Ordering::SeqCst), 2);
        assert_eq!(cache.tree_entries(), 2);

        cache.clear();
        cache.descendants(&tree, 5, 2);
        assert_eq!(tree.walks.load(Ordering::SeqCst), 3);
    }
}
