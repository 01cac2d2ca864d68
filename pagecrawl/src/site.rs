//! YAML site fixture: page tree, record collections, configuration records,
//! page configuration text and the backend user in one document.
//!
//! ```yaml
//! pages:
//!   - { uid: 1, pid: 0, title: Home }
//!   - { uid: 10, pid: 1, title: News }
//! collections:
//!   sys_category:
//!     columns: [pid, slug]
//!     rows:
//!       - { uid: 3, pid: 10, slug: sport }
//! configurations:
//!   - { uid: 1, pid: 1, name: categories, configuration: "&cat=[_TABLE:sys_category]" }
//! backend_user: { admin: false, groups: "1,2" }
//! page_config:
//!   1: |
//!     tx_crawler.crawlerCfg.paramSets.lang = &L=[0-1]
//! ```
use crate::access::BackendUser;
use crate::pages::{InMemoryPageTree, PageId, PageRecord};
use crate::records::{Collection, InMemoryRecordStore};
use crate::resolver::ConfigurationRecord;
use indexmap::IndexMap;
use pagecrawl_config::{ConfigError, Configurable, ParsedTree, SettingsTree};
use std::path;

#[derive(Debug, Clone)]
pub struct Site {
    config: serde_yaml::Value,
    pages: InMemoryPageTree,
}

impl Configurable for Site {
    fn config(&self) -> &serde_yaml::Value {
        &self.config
    }
}

impl Site {
    pub fn load(path: impl AsRef<path::Path>) -> Result<Self, ConfigError> {
        let config = Self::load_config(path)?;
        Self::from_value(config)
    }

    pub fn from_value(config: serde_yaml::Value) -> Result<Self, ConfigError> {
        let mut site = Self {
            config,
            pages: InMemoryPageTree::new(),
        };
        let pages: Vec<PageRecord> = site.section("pages")?;
        tracing::debug!(pages = pages.len(), "site loaded");
        site.pages = InMemoryPageTree::from_pages(pages);
        Ok(site)
    }

    /// Optional top-level section; missing means empty.
    fn section<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.get_config_as(key) {
            Err(ConfigError::Missing(_)) => Ok(T::default()),
            other => other,
        }
    }

    pub fn page_tree(&self) -> InMemoryPageTree {
        self.pages.clone()
    }

    pub fn contains_page(&self, page: PageId) -> bool {
        self.pages.contains(page)
    }

    pub fn record_store(&self) -> Result<InMemoryRecordStore, ConfigError> {
        let collections: IndexMap<String, Collection> = self.section("collections")?;
        let mut store = InMemoryRecordStore::new();
        for (name, collection) in collections {
            store.insert_collection(name, collection);
        }
        Ok(store)
    }

    /// Visible configuration records stored on the root line of `page`,
    /// in fixture order.
    pub fn configuration_records(
        &self,
        page: PageId,
    ) -> Result<Vec<ConfigurationRecord>, ConfigError> {
        let root_line = self.pages.root_line(page);
        let records: Vec<ConfigurationRecord> = self.section("configurations")?;
        Ok(records
            .into_iter()
            .filter(|r| !r.deleted && !r.hidden && root_line.contains(&r.pid))
            .collect())
    }

    pub fn backend_user(&self) -> Result<BackendUser, ConfigError> {
        self.section("backend_user")
    }

    /// Page configuration of `page`: the text of every page on its root
    /// line, site root first, so deeper pages override their ancestors.
    pub fn page_config(&self, page: PageId) -> Result<ParsedTree, ConfigError> {
        let texts: IndexMap<PageId, String> = self.section("page_config")?;
        let mut root_line = self.pages.root_line(page);
        root_line.reverse();
        let text = root_line
            .iter()
            .filter_map(|uid| texts.get(uid))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(SettingsTree::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::PageTree;
    use crate::records::RecordStore;

    const SITE: &str = r#"
pages:
  - { uid: 1, pid: 0, title: Home }
  - { uid: 10, pid: 1, title: News }
  - { uid: 11, pid: 10, title: Archive }
  - { uid: 12, pid: 10, title: Gone, deleted: true }
  - { uid: 20, pid: 1, title: Shop }
collections:
  sys_category:
    columns: [pid, slug]
    rows:
      - { uid: 3, pid: 10, slug: sport }
configurations:
  - { uid: 1, pid: 1, name: root, configuration: "&a=1" }
  - { uid: 2, pid: 10, name: news, configuration: "&b=1", hidden: 1 }
  - { uid: 3, pid: 20, name: shop, configuration: "&c=1" }
  - { uid: 4, pid: 10, name: archive, configuration: "&d=1" }
backend_user: { groups: "1,2" }
page_config:
  1: |
    tx_crawler.crawlerCfg.paramSets.lang = &L=[0-1]
    tx_crawler.crawlerCfg.paramSets.lang.pidsOnly = 1
  10: |
    tx_crawler.crawlerCfg.paramSets.lang.pidsOnly = 10,11
"#;

    fn site() -> Site {
        Site::from_value(serde_yaml::from_str(SITE).unwrap()).unwrap()
    }

    #[test]
    fn test_page_tree_skips_deleted() {
        let site = site();
        assert!(site.contains_page(11));
        assert!(!site.contains_page(12));
        assert_eq!(site.page_tree().descendant_ids(1, 99), vec![10, 11, 20]);
    }

    #[test]
    fn test_configuration_records_follow_root_line() {
        let names: Vec<String> = site()
            .configuration_records(11)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["root", "archive"]);
    }

    #[test]
    fn test_page_config_merges_root_line() {
        let site = site();
        let path = "tx_crawler.crawlerCfg.paramSets.lang";

        let root = site.page_config(1).unwrap();
        assert_eq!(root.tree.value(&format!("{path}.pidsOnly")).as_deref(), Some("1"));

        let archive = site.page_config(11).unwrap();
        assert!(archive.issues.is_empty());
        assert_eq!(archive.tree.value(path).as_deref(), Some("&L=[0-1]"));
        assert_eq!(
            archive.tree.value(&format!("{path}.pidsOnly")).as_deref(),
            Some("10,11")
        );
    }

    #[test]
    fn test_record_store_and_user() {
        let site = site();
        let store = site.record_store().unwrap();
        assert!(store.schema("sys_category").is_some_and(|s| s.has_column("slug")));
        assert_eq!(site.backend_user().unwrap(), BackendUser::with_groups("1,2"));
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let site = Site::from_value(serde_yaml::from_str("pages: []").unwrap()).unwrap();
        assert!(site.configuration_records(1).unwrap().is_empty());
        assert!(site.page_config(1).unwrap().tree.is_empty());
        assert_eq!(site.backend_user().unwrap(), BackendUser::default());
        assert!(site.record_store().unwrap().schema("x").is_none());
    }

    #[test]
    fn test_invalid_section_is_an_error() {
        let site = Site::from_value(serde_yaml::from_str("pages: nope").unwrap());
        assert!(matches!(site, Err(ConfigError::Invalid { .. })));
    }
}
