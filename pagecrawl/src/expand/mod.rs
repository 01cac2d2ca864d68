//! The parameter expansion engine.
//!
//! A parameter value wrapped in brackets is a `|`-separated list of
//! segments, each one of:
//!
//! - `a-b`: integer range, both ends inclusive, at most 1000 values
//!   (`1-34`, `-40--30`)
//! - `_TABLE:name;_PID:..;...`: values looked up in a record collection
//! - anything else: a literal value
//!
//! Unbracketed values are taken literally.
pub mod cache;
pub mod exclude;
pub mod lookup;
pub mod parameters;
pub mod range;

pub use cache::ExpansionCache;
pub use exclude::{expand_exclude_string, ExcludeToken};
pub use lookup::{ExternalValueLookup, LookupDirective};
pub use parameters::{ExpansionHook, HookContext, ParameterExpander};
pub use range::{IntRange, RANGE_LIMIT};
