//! Page hierarchy access.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type PageId = i64;

pub trait PageTree: Send + Sync {
    /// Ids below `root`, at most `depth` levels down, depth-first in sibling
    /// order. The root itself is not included.
    fn descendant_ids(&self, root: PageId, depth: u32) -> Vec<PageId>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub uid: PageId,
    #[serde(default)]
    pub pid: PageId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Page tree held in memory, built from flat `uid`/`pid` records.
/// Deleted pages and everything below them are invisible.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPageTree {
    children: IndexMap<PageId, Vec<PageId>>,
    parents: HashMap<PageId, PageId>,
}

impl InMemoryPageTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pages(pages: impl IntoIterator<Item = PageRecord>) -> Self {
        let mut tree = Self::new();
        for page in pages.into_iter().filter(|p| !p.deleted) {
            tree.insert(page.uid, page.pid);
        }
        tree
    }

    pub fn insert(&mut self, uid: PageId, pid: PageId) {
        self.parents.insert(uid, pid);
        self.children.entry(pid).or_default().push(uid);
    }

    /// `page` followed by its ancestors up to the site root.
    pub fn root_line(&self, page: PageId) -> Vec<PageId> {
        let mut line = vec![page];
        let mut current = page;
        while let Some(&parent) = self.parents.get(&current) {
            // pid 0 is the virtual root; cycles in broken data stop here too
            if parent == 0 || line.contains(&parent) {
                break;
            }
            line.push(parent);
            current = parent;
        }
        line
    }

    pub fn contains(&self, page: PageId) -> bool {
        self.parents.contains_key(&page)
    }

    fn walk(&self, node: PageId, depth: u32, out: &mut Vec<PageId>) {
        if depth == 0 {
            return;
        }
        for &child in self.children.get(&node).into_iter().flatten() {
            if out.contains(&child) {
                continue;
            }
            out.push(child);
            self.walk(child, depth - 1, out);
        }
    }
}

impl PageTree for InMemoryPageTree {
    fn descendant_ids(&self, root: PageId, depth: u32) -> Vec<PageId> {
        let mut out = Vec::new();
        self.walk(root, depth, &mut out);
        out
    }
}
