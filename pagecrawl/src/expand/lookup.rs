use super::ExpansionCache;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::DirectiveError;
use crate::pages::{PageId, PageTree};
use crate::records::{RecordQuery, RecordStore};
use indexmap::IndexSet;
use pagecrawl_urls::ParamValue;
use serde_json::Value;
use std::str::FromStr;

pub const DIRECTIVE_PREFIX: &str = "_TABLE:";

/// Parsed `_TABLE:name;_PID:..;_RECURSIVE:..;...` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupDirective {
    pub table: String,
    /// Page the records live on; the current page when absent.
    pub pid: Option<PageId>,
    /// Tree levels below `pid` whose records are included too.
    pub recursive: u32,
    pub pid_field: String,
    pub filter: Option<String>,
    pub join: Option<String>,
    pub field: String,
    /// Only original records, no translations.
    pub enable_lang: bool,
}

impl LookupDirective {
    pub fn is_directive(segment: &str) -> bool {
        segment.trim().starts_with(DIRECTIVE_PREFIX)
    }
}

impl FromStr for LookupDirective {
    type Err = DirectiveError;

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        let mut directive = LookupDirective {
            table: String::new(),
            pid: None,
            recursive: 0,
            pid_field: "pid".to_string(),
            filter: None,
            join: None,
            field: "uid".to_string(),
            enable_lang: false,
        };

        for part in segment.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once(':')
                .ok_or_else(|| DirectiveError::MissingSeparator(part.to_string()))?;
            let (key, value) = (key.trim(), value.trim());
            match key {
                "_TABLE" => directive.table = value.to_string(),
                "_PID" => directive.pid = Some(number(key, value)?),
                "_RECURSIVE" => {
                    directive.recursive = number::<i64>(key, value)?.clamp(0, i64::from(u32::MAX)) as u32
                }
                "_PIDFIELD" if !value.is_empty() => directive.pid_field = value.to_string(),
                "_WHERE" if !value.is_empty() => directive.filter = Some(value.to_string()),
                "_ADDTABLE" if !value.is_empty() => directive.join = Some(value.to_string()),
                "_FIELD" if !value.is_empty() => directive.field = value.to_string(),
                "_ENABLELANG" => directive.enable_lang = !matches!(value, "" | "0"),
                "_PIDFIELD" | "_WHERE" | "_ADDTABLE" | "_FIELD" => {}
                other => tracing::debug!(key = other, "ignoring unknown directive key"),
            }
        }

        if directive.table.is_empty() {
            return Err(DirectiveError::MissingTable);
        }
        Ok(directive)
    }
}

fn number<T: FromStr>(key: &str, value: &str) -> Result<T, DirectiveError> {
    value.parse().map_err(|_| DirectiveError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Resolves lookup directives against the record store.
pub struct ExternalValueLookup<'a> {
    pub pages: &'a dyn PageTree,
    pub records: &'a dyn RecordStore,
}

impl<'a> ExternalValueLookup<'a> {
    pub fn new(pages: &'a dyn PageTree, records: &'a dyn RecordStore) -> Self {
        Self { pages, records }
    }

    /// Distinct values of the directive's field, in first-seen order. Any
    /// problem is recorded in `diagnostics` and yields no values.
    pub fn lookup(
        &self,
        directive: &LookupDirective,
        page_id: PageId,
        cache: &mut ExpansionCache,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ParamValue> {
        let context = format!("_TABLE:{}", directive.table);
        let Some(schema) = self.records.schema(&directive.table) else {
            diagnostics.record(
                DiagnosticKind::UnknownCollection,
                context,
                format!("collection `{}` does not exist", directive.table),
            );
            return Vec::new();
        };
        if !schema.has_column(&directive.field) {
            diagnostics.record(
                DiagnosticKind::UnknownField,
                context,
                format!(
                    "collection `{}` has no field `{}`",
                    directive.table, directive.field
                ),
            );
            return Vec::new();
        }

        let root = directive.pid.unwrap_or(page_id);
        let mut location_ids = vec![root];
        if directive.recursive > 0 {
            location_ids.extend(cache.descendants(self.pages, root, directive.recursive));
        }

        let originals_only_field = if directive.enable_lang {
            schema.translation_origin_field.clone()
        } else {
            None
        };

        let query = RecordQuery {
            collection: directive.table.clone(),
            select: directive.field.clone(),
            location_field: directive.pid_field.clone(),
            location_ids,
            filter: directive.filter.clone(),
            join: directive.join.clone(),
            originals_only_field,
            exclude_soft_deleted: true,
        };

        match self.records.query(&query) {
            Ok(rows) => {
                let values: IndexSet<ParamValue> = rows
                    .iter()
                    .map(|row| to_param_value(row.get(&directive.field)))
                    .collect();
                tracing::debug!(
                    table = %directive.table,
                    field = %directive.field,
                    count = values.len(),
                    "lookup resolved"
                );
                values.into_iter().collect()
            }
            Err(err) => {
                diagnostics.record(DiagnosticKind::LookupFailed, context, err.to_string());
                Vec::new()
            }
        }
    }
}

/// Integer-looking values become integers so they compare equal to range
/// output.
fn to_param_value(value: Option<&Value>) -> ParamValue {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => ParamValue::Int(i),
            None => ParamValue::Text(n.to_string()),
        },
        Some(Value::String(s)) => match s.parse::<i64>() {
            Ok(i) if i.to_string() == *s => ParamValue::Int(i),
            _ => ParamValue::Text(s.clone()),
        },
        Some(Value::Bool(b)) => ParamValue::Int(i64::from(*b)),
        Some(other @ (Value::Array(_) | Value::Object(_))) => {
            ParamValue::Text(other.to_string())
        }
        Some(Value::Null) | None => ParamValue::Text(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::InMemoryPageTree;
    use crate::records::{Collection, InMemoryRecordStore};
    use serde_json::json;

    fn directive(s: &str) -> LookupDirective {
        s.parse().unwrap()
    }

    fn fixtures() -> (InMemoryPageTree, InMemoryRecordStore) {
        let mut pages = InMemoryPageTree::new();
        for (uid, pid) in [(1, 0), (10, 1), (11, 10), (12, 11)] {
            pages.insert(uid, pid);
        }
        let news: Collection = serde_json::from_value(json!({
            "columns": ["pid", "path_segment", "l10n_parent", "hidden"],
            "translation_origin_field": "l10n_parent",
            "rows": [
                {"uid": 1, "pid": 10, "path_segment": "alpha", "hidden": 0},
                {"uid": 2, "pid": 10, "path_segment": "beta", "hidden": 1},
                {"uid": 3, "pid": 11, "path_segment": "alpha", "hidden": 0},
                {"uid": 4, "pid": 12, "path_segment": "gamma", "hidden": 0},
                {"uid": 5, "pid": 10, "path_segment": "alpha-de", "l10n_parent": 1},
                {"uid": 6, "pid": 10, "path_segment": "old", "deleted": 1},
            ]
        }))
        .unwrap();
        let mut records = InMemoryRecordStore::new();
        records.insert_collection("tx_news", news);
        (pages, records)
    }

    fn run(segment: &str, page: PageId) -> (Vec<ParamValue>, Diagnostics) {
        let (pages, records) = fixtures();
        let lookup = ExternalValueLookup::new(&pages, &records);
        let mut cache = ExpansionCache::new();
        let mut diagnostics = Diagnostics::new();
        let values = lookup.lookup(&directive(segment), page, &mut cache, &mut diagnostics);
        (values, diagnostics)
    }

    fn ints(values: &[i64]) -> Vec<ParamValue> {
        values.iter().copied().map(ParamValue::Int).collect()
    }

    #[test]
    fn test_parse_defaults() {
        let d = directive("_TABLE:tx_news");
        assert_eq!(d.table, "tx_news");
        assert_eq!(d.pid, None);
        assert_eq!(d.recursive, 0);
        assert_eq!(d.pid_field, "pid");
        assert_eq!(d.field, "uid");
        assert!(!d.enable_lang);
    }

    #[test]
    fn test_parse_all_keys() {
        let d = directive(
            "_TABLE: tx_news ; _PID:10; _RECURSIVE:2;_PIDFIELD:storage;_WHERE:hidden=0;_ADDTABLE:x;_FIELD:path_segment;_ENABLELANG:1;",
        );
        assert_eq!(d.table, "tx_news");
        assert_eq!(d.pid, Some(10));
        assert_eq!(d.recursive, 2);
        assert_eq!(d.pid_field, "storage");
        assert_eq!(d.filter.as_deref(), Some("hidden=0"));
        assert_eq!(d.join.as_deref(), Some("x"));
        assert_eq!(d.field, "path_segment");
        assert!(d.enable_lang);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "_TABLE:tx_news;_PID".parse::<LookupDirective>(),
            Err(DirectiveError::MissingSeparator("_PID".into()))
        );
        assert_eq!(
            "_TABLE:".parse::<LookupDirective>(),
            Err(DirectiveError::MissingTable)
        );
        assert!(matches!(
            "_TABLE:a;_PID:ten".parse::<LookupDirective>(),
            Err(DirectiveError::InvalidNumber { .. })
        ));
        assert!(LookupDirective::is_directive("  _TABLE:a"));
        assert!(!LookupDirective::is_directive("TABLE:a"));
    }

    #[test]
    fn test_lookup_current_page() {
        let (values, diagnostics) = run("_TABLE:tx_news", 10);
        assert_eq!(values, ints(&[1, 2, 5]));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_lookup_explicit_pid_recursive() {
        let (values, _) = run("_TABLE:tx_news;_PID:10;_RECURSIVE:1", 1);
        assert_eq!(values, ints(&[1, 2, 3, 5]));

        let (values, _) = run("_TABLE:tx_news;_PID:10;_RECURSIVE:5", 1);
        assert_eq!(values, ints(&[1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_lookup_field_values_are_distinct() {
        let (values, _) =
            run("_TABLE:tx_news;_PID:10;_RECURSIVE:1;_FIELD:path_segment", 1);
        assert_eq!(
            values,
            vec![
                ParamValue::from("alpha"),
                ParamValue::from("beta"),
                ParamValue::from("alpha-de"),
            ]
        );
    }

    #[test]
    fn test_lookup_enable_lang_and_where() {
        let (values, _) = run("_TABLE:tx_news;_ENABLELANG:1", 10);
        assert_eq!(values, ints(&[1, 2]));

        let (values, _) = run("_TABLE:tx_news;_WHERE:hidden = 0", 10);
        assert_eq!(values, ints(&[1]));
    }

    #[test]
    fn test_lookup_failures_are_diagnostics() {
        let (values, diagnostics) = run("_TABLE:tx_missing", 10);
        assert!(values.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::UnknownCollection), 1);

        let (values, diagnostics) = run("_TABLE:tx_news;_FIELD:bodytext", 10);
        assert!(values.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::UnknownField), 1);

        let (values, diagnostics) = run("_TABLE:tx_news;_ADDTABLE:sys_category", 10);
        assert!(values.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::LookupFailed), 1);
    }

    #[test]
    fn test_to_param_value() {
        assert_eq!(to_param_value(Some(&json!(7))), ParamValue::Int(7));
        assert_eq!(to_param_value(Some(&json!("12"))), ParamValue::Int(12));
        assert_eq!(to_param_value(Some(&json!("012"))), ParamValue::from("012"));
        assert_eq!(to_param_value(Some(&json!(1.5))), ParamValue::from("1.5"));
        assert_eq!(to_param_value(None), ParamValue::from(""));
    }
}
