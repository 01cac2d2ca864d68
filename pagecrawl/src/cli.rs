use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pagecrawl",
    version,
    about = "Expand crawler parameter configuration into the URLs to crawl"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log: String,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve every crawler configuration of a page into URLs
    ///
    /// Example: pagecrawl resolve --site site.yml --page 10 --config news,lang
    Resolve {
        /// YAML site fixture
        #[arg(long)]
        site: PathBuf,

        /// Page to resolve
        #[arg(long)]
        page: i64,

        /// TOML extension settings (`[crawler] max_compile_urls`)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Mount point appended as `&MP=` to inline configurations
        #[arg(long)]
        mount_point: Option<String>,

        /// Keep only these configuration names
        #[arg(long, value_delimiter = ',')]
        config: Vec<String>,

        /// Keep only URLs matching one of these patterns
        #[arg(long)]
        include: Vec<String>,

        /// Drop URLs matching one of these patterns
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Expand a single parameter value such as "[1-3|7]"
    Expand {
        /// Parameter value to expand
        #[arg(long)]
        value: String,

        /// YAML site fixture for `_TABLE:` lookups
        #[arg(long)]
        site: Option<PathBuf>,

        /// Page the lookups run for
        #[arg(long, default_value_t = 0)]
        page: i64,
    },

    /// Expand an exclusion list such as "5+1,9" into page ids
    Exclude {
        /// YAML site fixture providing the page tree
        #[arg(long)]
        site: PathBuf,

        /// Exclusion list
        #[arg(long)]
        list: String,
    },
}
