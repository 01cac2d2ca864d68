//! Query-string side of pagecrawl.
//!
//! Parses configuration strings into parameter specs, compiles expanded
//! parameters into URLs and post-processes URL lists through middleware.

pub mod compiler;
pub mod middleware;
pub mod params;
pub mod urls;

pub use compiler::{QueryStringCompiler, UrlCompiler};
pub use middleware::{
    DeduplicateMiddleware, LimitMiddleware, Middleware, RegexFilterMiddleware,
};
pub use params::{
    explode_query, raw_url_encode, ExpandedParameters, ParamValue, ParameterSpec,
};
pub use urls::UrlList;

// Re-export
pub use url;
