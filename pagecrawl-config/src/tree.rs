//! Nested settings in the TypoScript shape used by the host platform.
//!
//! A node `a` holding both a value and children is stored as two keys in the
//! parent mapping: `a` for the value and `a.` for the children. Paths are
//! dot-delimited, so `tx_crawler.crawlerCfg.paramSets` walks
//! `tx_crawler.` → `crawlerCfg.` → `paramSets.`.
//!
//! The text form understood by [`SettingsTree::parse`]:
//! ```text
//! # comment
//! tx_crawler.crawlerCfg.paramSets.news = &tx_news[id]=[1-10]
//! tx_crawler.crawlerCfg.paramSets.news {
//!     pidsOnly = 10,20
//! }
//! obsolete.setting >
//! ```
use serde_yaml::{Mapping, Value};

/// A problem found while parsing settings text. Parsing never aborts; the
/// offending line is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedTree {
    pub tree: SettingsTree,
    pub issues: Vec<ParseIssue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsTree {
    root: Mapping,
}

impl SettingsTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already nested value; anything but a mapping yields an
    /// empty tree.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Mapping(root) => Self { root },
            _ => Self::default(),
        }
    }

    pub fn parse(text: &str) -> ParsedTree {
        let mut tree = SettingsTree::new();
        let mut issues = Vec::new();
        let mut blocks: Vec<String> = Vec::new();
        let mut in_comment = false;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            let mut issue = |message: String| {
                issues.push(ParseIssue {
                    line: line_no,
                    message,
                })
            };

            if in_comment {
                if line.contains("*/") {
                    in_comment = false;
                }
                continue;
            }
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }
            if line.starts_with("/*") {
                in_comment = !line.contains("*/");
                continue;
            }
            if line == "}" {
                if blocks.pop().is_none() {
                    issue("closing brace without open block".to_string());
                }
                continue;
            }

            let eq = line.find('=');
            let brace = line.find('{');
            match (eq, brace) {
                (Some(eq), b) if b.map_or(true, |b| eq < b) => {
                    let path = line[..eq].trim();
                    if !is_valid_path(path) {
                        issue(format!("invalid path `{path}`"));
                        continue;
                    }
                    tree.set(&qualify(&blocks, path), line[eq + 1..].trim());
                }
                (_, Some(_)) if line.ends_with('{') => {
                    let path = line[..line.len() - 1].trim();
                    if !is_valid_path(path) {
                        issue(format!("invalid block name `{path}`"));
                        continue;
                    }
                    blocks.push(qualify(&blocks, path));
                }
                _ => match line.strip_suffix('>') {
                    Some(path) if is_valid_path(path.trim()) => {
                        tree.unset(&qualify(&blocks, path.trim()));
                    }
                    _ => issue(format!("unrecognized line `{line}`")),
                },
            }
        }

        if !blocks.is_empty() {
            issues.push(ParseIssue {
                line: text.lines().count(),
                message: format!("{} block(s) left open", blocks.len()),
            });
        }

        ParsedTree { tree, issues }
    }

    /// Assigns `value` at `path`, creating intermediate nodes.
    pub fn set(&mut self, path: &str, value: &str) {
        let (parents, leaf) = split_leaf(path);
        let mut node = &mut self.root;
        for segment in parents {
            let key = Value::String(format!("{segment}."));
            if !matches!(node.get(&key), Some(Value::Mapping(_))) {
                node.insert(key.clone(), Value::Mapping(Mapping::new()));
            }
            node = match node.get_mut(&key) {
                Some(Value::Mapping(child)) => child,
                _ => return,
            };
        }
        node.insert(
            Value::String(leaf.to_string()),
            Value::String(value.to_string()),
        );
    }

    /// Removes the value and the children of `path`.
    pub fn unset(&mut self, path: &str) {
        let (parents, leaf) = split_leaf(path);
        let mut node = &mut self.root;
        for segment in parents {
            node = match node.get_mut(format!("{segment}.").as_str()) {
                Some(Value::Mapping(child)) => child,
                _ => return,
            };
        }
        node.remove(leaf);
        node.remove(format!("{leaf}.").as_str());
    }

    /// Children mapping of `path`; the empty path is the root.
    pub fn node(&self, path: &str) -> Option<&Mapping> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split('.').try_fold(&self.root, |node, segment| {
            node.get(format!("{segment}.").as_str())
                .and_then(Value::as_mapping)
        })
    }

    /// Scalar value of `path`, rendered as a string.
    pub fn value(&self, path: &str) -> Option<String> {
        let (parent, leaf) = match path.rsplit_once('.') {
            Some((parent, leaf)) => (self.node(parent)?, leaf),
            None => (&self.root, path),
        };
        scalar_string(parent.get(leaf)?)
    }

    /// Names of the child nodes under `path`, in declaration order.
    pub fn child_names(&self, path: &str) -> Vec<String> {
        let Some(node) = self.node(path) else {
            return Vec::new();
        };
        node.iter()
            .filter(|(_, v)| v.is_mapping())
            .filter_map(|(k, _)| k.as_str()?.strip_suffix('.').map(str::to_string))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Mapping(self.root.clone())
    }
}

pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn split_leaf(path: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = segments.pop().unwrap_or_default();
    (segments, leaf)
}

fn qualify(blocks: &[String], path: &str) -> String {
    match blocks.last() {
        Some(prefix) => format!("{prefix}.{path}"),
        None => path.to_string(),
    }
}

fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}
