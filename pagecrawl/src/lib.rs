//! # pagecrawl
//!
//! Turns crawler parameter configuration into the concrete URLs to crawl
//! for one page.
//!
//! A configuration such as `&L=[0-2]&cat=[_TABLE:sys_category;_PID:10]`
//! is parsed into parameters, every bracketed value is expanded into its
//! set of values (integer ranges, record lookups, literals) and the
//! Cartesian product of all sets is compiled into query strings.
//!
//! Configurations come from two places: inline page configuration
//! (`tx_crawler.crawlerCfg.paramSets`) and persisted configuration records
//! on the page's root line. Inline entries take precedence by name.
//!
//! Expansion is best-effort. Nothing the engine skips aborts resolution;
//! each skip is recorded in [`Diagnostics`].
//!
//! ## Modules
//!
//! - `expand`: range, record lookup and exclusion expansion plus the
//!   `ParameterExpander` that drives them.
//! - `resolver`: `ConfigurationResolver`, merging both configuration
//!   sources into compiled configurations.
//! - `pages`, `records`: the page tree and record store seams with
//!   in-memory implementations.
//! - `access`: backend user group checks.
//! - `site`: YAML site fixtures feeding the in-memory implementations.
//! - `diagnostics`: structured record of skipped and truncated input.
pub mod access;
pub mod diagnostics;
pub mod error;
pub mod expand;
pub mod observability;
pub mod pages;
pub mod records;
pub mod resolver;
pub mod site;

pub use access::{has_group_access, BackendUser};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{DirectiveError, StoreError};
pub use expand::{ExpansionCache, ExpansionHook, HookContext, ParameterExpander};
pub use pages::{InMemoryPageTree, PageId, PageRecord, PageTree};
pub use records::{Collection, CollectionSchema, InMemoryRecordStore, RecordQuery, RecordStore, Row};
pub use resolver::{
    retain_allowed, CompiledConfiguration, ConfigurationRecord, ConfigurationResolver,
    Configurations, Origin, ResolveRequest, SubConfiguration,
};
pub use site::Site;

pub use pagecrawl_config as config;
pub use pagecrawl_urls as urls;
// re-export
pub use indexmap;
pub use serde;
pub use serde_json;
pub use serde_yaml;
pub use thiserror;
pub use tracing;
pub use tracing_subscriber;
