//! Record collections queried by `_TABLE:` lookups.
use crate::error::StoreError;
use crate::pages::PageId;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::LazyLock;

pub type Row = serde_json::Map<String, Value>;

/// Field every collection uses for soft deletion.
pub const SOFT_DELETE_FIELD: &str = "deleted";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Declared columns. `uid` is always selectable and need not be listed.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Field pointing from a translation to its original record.
    #[serde(default)]
    pub translation_origin_field: Option<String>,
}

impl CollectionSchema {
    pub fn has_column(&self, field: &str) -> bool {
        field == "uid" || self.columns.iter().any(|c| c == field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub collection: String,
    pub select: String,
    /// Rows match when this field holds one of `location_ids`.
    pub location_field: String,
    pub location_ids: Vec<PageId>,
    pub filter: Option<String>,
    pub join: Option<String>,
    /// Keep only original records, i.e. this field `<= 0`.
    pub originals_only_field: Option<String>,
    pub exclude_soft_deleted: bool,
}

pub trait RecordStore: Send + Sync {
    fn schema(&self, collection: &str) -> Option<&CollectionSchema>;
    fn query(&self, query: &RecordQuery) -> Result<Vec<Row>, StoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(flatten)]
    pub schema: CollectionSchema,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryRecordStore {
    collections: IndexMap<String, Collection>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_collection(&mut self, name: impl Into<String>, collection: Collection) {
        self.collections.insert(name.into(), collection);
    }
}

impl RecordStore for InMemoryRecordStore {
    fn schema(&self, collection: &str) -> Option<&CollectionSchema> {
        self.collections.get(collection).map(|c| &c.schema)
    }

    fn query(&self, query: &RecordQuery) -> Result<Vec<Row>, StoreError> {
        let collection = self
            .collections
            .get(&query.collection)
            .ok_or_else(|| StoreError::UnknownCollection(query.collection.clone()))?;
        if let Some(join) = query.join.as_deref().filter(|j| !j.trim().is_empty()) {
            return Err(StoreError::UnsupportedJoin(join.to_string()));
        }
        let conditions = match query.filter.as_deref() {
            Some(expr) => parse_filter(expr)?,
            None => Vec::new(),
        };

        let rows = collection
            .rows
            .iter()
            .filter(|row| {
                !query.exclude_soft_deleted || !truthy(row.get(SOFT_DELETE_FIELD))
            })
            .filter(|row| {
                as_integer(row.get(&query.location_field))
                    .is_some_and(|pid| query.location_ids.contains(&pid))
            })
            .filter(|row| match &query.originals_only_field {
                Some(field) => as_integer(row.get(field)).unwrap_or(0) <= 0,
                None => true,
            })
            .filter(|row| conditions.iter().all(|c| c.matches(row)))
            .map(|row| {
                let mut selected = Row::new();
                let value = row.get(&query.select).cloned().unwrap_or(Value::Null);
                selected.insert(query.select.clone(), value);
                selected
            })
            .collect();
        Ok(rows)
    }
}

static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(<=|>=|!=|<>|=|<|>)\s*('[^']*'|"[^"]*"|-?[0-9]+(?:\.[0-9]+)?)\s*$"#)
        .expect("Failed to compile filter condition regex")
});

static AND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+AND\s+").expect("Failed to compile AND regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    field: String,
    op: Op,
    literal: Value,
}

impl Condition {
    fn matches(&self, row: &Row) -> bool {
        let Some(value) = row.get(&self.field) else {
            return false;
        };
        let Some(ordering) = compare(value, &self.literal) else {
            return false;
        };
        match self.op {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
        }
    }
}

/// Parses `field op literal [AND field op literal ...]`.
fn parse_filter(expr: &str) -> Result<Vec<Condition>, StoreError> {
    if expr.trim().is_empty() {
        return Ok(Vec::new());
    }
    AND_RE
        .split(expr.trim())
        .map(|part| {
            let caps = CONDITION_RE.captures(part).ok_or_else(|| {
                StoreError::UnsupportedFilter {
                    expr: expr.to_string(),
                    reason: format!("cannot parse `{}`", part.trim()),
                }
            })?;
            let op = match &caps[2] {
                "=" => Op::Eq,
                "!=" | "<>" => Op::Ne,
                "<" => Op::Lt,
                "<=" => Op::Le,
                ">" => Op::Gt,
                _ => Op::Ge,
            };
            let raw = &caps[3];
            let literal = if raw.starts_with('\'') || raw.starts_with('"') {
                Value::String(raw[1..raw.len() - 1].to_string())
            } else {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
            };
            Ok(Condition {
                field: caps[1].to_string(),
                op,
                literal,
            })
        })
        .collect()
}

fn compare(value: &Value, literal: &Value) -> Option<Ordering> {
    match (as_number(value), as_number(literal)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(as_text(value)?.cmp(&as_text(literal)?)),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(u8::from(*b).to_string()),
        _ => None,
    }
}

pub(crate) fn as_integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(other) => as_integer(Some(other)).is_some_and(|i| i != 0),
        None => false,
    }
}
