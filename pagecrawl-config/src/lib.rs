//! Configuration plumbing for pagecrawl.
//!
//! - `config`: the `Configurable` trait for YAML-backed site fixtures.
//! - `settings`: extension-wide settings such as the URL compilation cap.
//! - `tree`: TypoScript-style settings text parsed into a nested tree that
//!   is read by dot-delimited paths.
pub mod config;
pub mod settings;
pub mod tree;

pub use config::{ConfigError, Configurable};
pub use settings::{ExtensionSettings, ExtensionSettingsBuilder};
pub use tree::{ParseIssue, ParsedTree, SettingsTree};
