use super::lookup::{ExternalValueLookup, LookupDirective};
use super::range::{IntRange, RANGE_LIMIT};
use super::ExpansionCache;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::pages::{PageId, PageTree};
use crate::records::RecordStore;
use pagecrawl_urls::{ExpandedParameters, ParamValue, ParameterSpec};
use std::collections::HashSet;
use std::sync::Arc;

pub type SharedPageTree = Arc<dyn PageTree>;
pub type SharedRecordStore = Arc<dyn RecordStore>;

/// What an expansion hook is told about the segment just processed.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub key: &'a str,
    pub segment: &'a str,
    pub page_id: PageId,
}

/// Post-processes the parameter map after every bracket segment, i.e. to
/// support placeholders of its own. Hooks run in registration order and
/// see each other's changes.
pub trait ExpansionHook: Send + Sync {
    fn after_segment(&self, params: &mut ExpandedParameters, ctx: &HookContext<'_>);
}

impl<F> ExpansionHook for F
where
    F: Fn(&mut ExpandedParameters, &HookContext<'_>) + Send + Sync,
{
    fn after_segment(&self, params: &mut ExpandedParameters, ctx: &HookContext<'_>) {
        self(params, ctx)
    }
}

pub struct ParameterExpander {
    pages: SharedPageTree,
    records: SharedRecordStore,
    hooks: Vec<Box<dyn ExpansionHook>>,
}

impl std::fmt::Debug for ParameterExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterExpander")
            .field("hooks_count", &self.hooks.len())
            .finish()
    }
}

impl ParameterExpander {
    pub fn new(pages: SharedPageTree, records: SharedRecordStore) -> Self {
        Self {
            pages,
            records,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl ExpansionHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn with_hooks(mut self, hooks: Vec<Box<dyn ExpansionHook>>) -> Self {
        self.hooks.extend(hooks);
        self
    }

    pub fn pages(&self) -> &dyn PageTree {
        self.pages.as_ref()
    }

    /// Expands every parameter of `spec` into its value set.
    ///
    /// Keys are visited in their original order. Each bracketed value is
    /// deduplicated after its segments are processed and the whole map is
    /// then re-sorted by key; a map of literals keeps its order.
    pub fn expand(
        &self,
        spec: &ParameterSpec,
        page_id: PageId,
        cache: &mut ExpansionCache,
        diagnostics: &mut Diagnostics,
    ) -> ExpandedParameters {
        // unexpanded values stay visible to hooks as single raw entries
        let mut params: ExpandedParameters = spec
            .iter()
            .map(|(k, v)| (k.clone(), vec![ParamValue::Text(v.clone())]))
            .collect();

        for (key, raw) in spec {
            let value = raw.trim();
            let Some(inner) = value
                .strip_prefix('[')
                .and_then(|v| v.strip_suffix(']'))
            else {
                params.insert(key.clone(), vec![ParamValue::Text(value.to_string())]);
                continue;
            };

            params.insert(key.clone(), Vec::new());
            for segment in inner.split('|') {
                let values = self.expand_segment(key, segment, page_id, cache, diagnostics);
                params.entry(key.clone()).or_default().extend(values);

                let ctx = HookContext {
                    key,
                    segment,
                    page_id,
                };
                for hook in &self.hooks {
                    hook.after_segment(&mut params, &ctx);
                }
            }

            if let Some(values) = params.get_mut(key) {
                dedup_by_string(values);
            }
            params.sort_keys();
        }

        params
    }

    fn expand_segment(
        &self,
        key: &str,
        segment: &str,
        page_id: PageId,
        cache: &mut ExpansionCache,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ParamValue> {
        if let Some(range) = IntRange::parse(segment) {
            if range.is_truncated() {
                diagnostics.record(
                    DiagnosticKind::CapExceeded,
                    format!("{key}={segment}"),
                    format!(
                        "range spans {} values, keeping the first {RANGE_LIMIT}",
                        range.span()
                    ),
                );
            }
            return range.values().map(ParamValue::Int).collect();
        }

        if LookupDirective::is_directive(segment) {
            return match segment.trim().parse::<LookupDirective>() {
                Ok(directive) => {
                    ExternalValueLookup::new(self.pages.as_ref(), self.records.as_ref())
                        .lookup(&directive, page_id, cache, diagnostics)
                }
                Err(err) => {
                    diagnostics.record(
                        DiagnosticKind::MalformedDirective,
                        format!("{key}={segment}"),
                        err.to_string(),
                    );
                    Vec::new()
                }
            };
        }

        vec![ParamValue::Text(segment.to_string())]
    }
}

/// Keeps the first of all values that render to the same string.
fn dedup_by_string(values: &mut Vec<ParamValue>) {
    let mut seen = HashSet::new();
    values.retain(|v| seen.insert(v.to_string()));
}
