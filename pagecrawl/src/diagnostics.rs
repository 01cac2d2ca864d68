//! Structured record of everything the engine skipped or truncated.
//!
//! Expansion is best-effort: a broken directive or an inaccessible record
//! never aborts resolution. Each such event lands here and is logged at
//! `warn`, so callers can audit degraded results.
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// `_TABLE:` directive that could not be parsed.
    MalformedDirective,
    /// Lookup against a collection the store does not know.
    UnknownCollection,
    /// Lookup selecting a field the collection does not declare.
    UnknownField,
    /// The record store refused or failed the query.
    LookupFailed,
    /// A range or the URL list hit its cap and was truncated.
    CapExceeded,
    /// A persisted configuration the backend user may not use.
    AccessDenied,
    /// Processing-instruction parameters with unparseable lines.
    MalformedProcessingInstructions,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MalformedDirective => "malformed_directive",
            DiagnosticKind::UnknownCollection => "unknown_collection",
            DiagnosticKind::UnknownField => "unknown_field",
            DiagnosticKind::LookupFailed => "lookup_failed",
            DiagnosticKind::CapExceeded => "cap_exceeded",
            DiagnosticKind::AccessDenied => "access_denied",
            DiagnosticKind::MalformedProcessingInstructions => {
                "malformed_processing_instructions"
            }
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// What was being processed, i.e. `L=[1-5000]` or `config:news`.
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        let event = Diagnostic {
            kind,
            context: context.into(),
            message: message.into(),
        };
        tracing::warn!(
            kind = %event.kind,
            context = %event.context,
            "{}",
            event.message
        );
        self.events.push(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.events
    }
}
