use super::ExpansionCache;
use crate::pages::{PageId, PageTree};
use indexmap::IndexSet;

/// Depth used for `pid+` without an explicit depth.
pub const UNBOUNDED_DEPTH: u32 = 99;

/// One `pid` or `pid+depth` entry of an exclusion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcludeToken {
    pub pid: PageId,
    pub depth: u32,
}

impl ExcludeToken {
    /// `5` is the page alone, `5+2` includes two levels below it, and `5+`
    /// (or a zero / unreadable depth after the `+`) descends without limit.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (pid, depth) = match token.split_once('+') {
            Some((pid, depth)) => {
                let depth = depth
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|d| *d > 0)
                    .unwrap_or(UNBOUNDED_DEPTH);
                (pid, depth)
            }
            None => (token, 0),
        };
        let pid = pid.trim().parse::<PageId>().ok()?;
        Some(Self { pid, depth })
    }
}

/// Expands `5,7+1,9+` into every page id it covers, self first then
/// descendants, without duplicates.
pub fn expand_exclude_string(
    list: &str,
    pages: &dyn PageTree,
    cache: &mut ExpansionCache,
) -> Vec<PageId> {
    if let Some(ids) = cache.exclusion(list) {
        tracing::trace!(list, "exclusion cache hit");
        return ids.clone();
    }

    let mut ids = IndexSet::new();
    for part in list.split(',').filter(|p| !p.trim().is_empty()) {
        let Some(token) = ExcludeToken::parse(part) else {
            tracing::debug!(part, list, "skipping unreadable exclusion entry");
            continue;
        };
        ids.insert(token.pid);
        if token.depth > 0 {
            ids.extend(cache.descendants(pages, token.pid, token.depth));
        }
    }

    let ids: Vec<PageId> = ids.into_iter().collect();
    cache.store_exclusion(list, ids.clone());
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{InMemoryPageTree, PageRecord};

    fn tree() -> InMemoryPageTree {
        let mut tree = InMemoryPageTree::new();
        for (uid, pid) in [(1, 0), (5, 1), (6, 5), (7, 5), (8, 6), (9, 1)] {
            tree.insert(uid, pid);
        }
        tree
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(ExcludeToken::parse("5"), Some(ExcludeToken { pid: 5, depth: 0 }));
        assert_eq!(
            ExcludeToken::parse(" 5 + 2 "),
            Some(ExcludeToken { pid: 5, depth: 2 })
        );
        assert_eq!(
            ExcludeToken::parse("5+"),
            Some(ExcludeToken { pid: 5, depth: 99 })
        );
        assert_eq!(
            ExcludeToken::parse("5+0"),
            Some(ExcludeToken { pid: 5, depth: 99 })
        );
        assert_eq!(ExcludeToken::parse("abc"), None);
    }

    #[test]
    fn test_page_only() {
        let mut cache = ExpansionCache::new();
        assert_eq!(expand_exclude_string("5", &tree(), &mut cache), vec![5]);
    }

    #[test]
    fn test_page_and_children() {
        let mut cache = ExpansionCache::new();
        assert_eq!(
            expand_exclude_string("5+1", &tree(), &mut cache),
            vec![5, 6, 7]
        );
    }

    #[test]
    fn test_unbounded_and_dedup() {
        let mut cache = ExpansionCache::new();
        assert_eq!(
            expand_exclude_string("5+, 6, 9 ,x", &tree(), &mut cache),
            vec![5, 6, 8, 7, 9]
        );
    }

    #[test]
    fn test_empty_list() {
        let mut cache = ExpansionCache::new();
        assert!(expand_exclude_string("", &tree(), &mut cache).is_empty());
        assert!(expand_exclude_string(" , ", &tree(), &mut cache).is_empty());
    }

    #[test]
    fn test_shared_tree_walks_are_cached() {
        let pages = InMemoryPageTree::from_pages(vec![
            PageRecord { uid: 1, pid: 0, ..Default::default() },
            PageRecord { uid: 2, pid: 1, ..Default::default() },
        ]);
        let mut cache = ExpansionCache::new();

        expand_exclude_string("1+1", &pages, &mut cache);
        expand_exclude_string("3,1+1", &pages, &mut cache);
        assert_eq!(cache.exclusion_entries(), 2);
        assert_eq!(cache.tree_entries(), 1);

        // same input string answered from the first-level cache
        assert_eq!(expand_exclude_string("1+1", &pages, &mut cache), vec![1, 2]);
    }
}
