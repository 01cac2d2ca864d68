mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use pagecrawl::{
    config::ExtensionSettings,
    expand::expand_exclude_string,
    observability,
    resolver::{retain_allowed, ResolveRequest},
    urls::{DeduplicateMiddleware, ParamValue, ParameterSpec, RegexFilterMiddleware, UrlList},
    Configurations, ConfigurationResolver, Diagnostics, ExpansionCache, InMemoryPageTree,
    InMemoryRecordStore, PageId, ParameterExpander, Site,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(untagged)]
enum Report {
    Resolved {
        page: PageId,
        configurations: Configurations,
        diagnostics: Diagnostics,
    },
    Expanded {
        values: Vec<ParamValue>,
        diagnostics: Diagnostics,
    },
    Excluded {
        pages: Vec<PageId>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = observability::init_tracing(&cli.log) {
        eprintln!("Error: {e:#}");
        std::process::exit(2);
    }

    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            2
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<()> {
    let report = match cli.command {
        Commands::Resolve {
            site,
            page,
            settings,
            mount_point,
            config,
            include,
            exclude,
        } => handle_resolve(
            &site,
            page,
            settings.as_deref(),
            mount_point.as_deref(),
            &config,
            &include,
            &exclude,
        )?,
        Commands::Expand { value, site, page } => handle_expand(&value, site.as_deref(), page)?,
        Commands::Exclude { site, list } => handle_exclude(&site, &list)?,
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{rendered}");
    Ok(())
}

fn load_site(path: &Path) -> Result<Site> {
    Site::load(path).with_context(|| format!("failed to load site fixture {}", path.display()))
}

fn expander_for(site: &Site) -> Result<ParameterExpander> {
    let records = site.record_store().context("invalid collections in site fixture")?;
    Ok(ParameterExpander::new(
        Arc::new(site.page_tree()),
        Arc::new(records),
    ))
}

fn handle_resolve(
    site_path: &Path,
    page: i64,
    settings_path: Option<&Path>,
    mount_point: Option<&str>,
    allowed: &[String],
    include: &[String],
    exclude: &[String],
) -> Result<Report> {
    let site = load_site(site_path)?;
    if !site.contains_page(page) {
        bail!("page {page} is not part of {}", site_path.display());
    }
    let settings = match settings_path {
        Some(path) => ExtensionSettings::load(path)
            .with_context(|| format!("failed to load settings {}", path.display()))?,
        None => ExtensionSettings::default(),
    };
    let include = RegexFilterMiddleware::new(include, true).context("invalid --include pattern")?;
    let exclude = RegexFilterMiddleware::new(exclude, false).context("invalid --exclude pattern")?;

    let mut diagnostics = Diagnostics::new();
    let parsed = site.page_config(page).context("invalid page_config in site fixture")?;
    for issue in &parsed.issues {
        tracing::warn!(line = issue.line, "page configuration: {}", issue.message);
    }
    let records = site
        .configuration_records(page)
        .context("invalid configurations in site fixture")?;
    let user = site.backend_user().context("invalid backend_user in site fixture")?;

    let resolver = ConfigurationResolver::new(expander_for(&site)?, settings);
    let request = ResolveRequest {
        page_id: page,
        mount_point,
        page_config: &parsed.tree,
        records: &records,
        user: &user,
    };
    let mut cache = ExpansionCache::new();
    let mut configurations = retain_allowed(
        allowed,
        resolver.resolve(&request, &mut cache, &mut diagnostics),
    );

    for compiled in configurations.values_mut() {
        compiled.urls = UrlList::new(std::mem::take(&mut compiled.urls))
            .apply(&DeduplicateMiddleware)
            .apply(&include)
            .apply(&exclude)
            .into_inner();
    }

    Ok(Report::Resolved {
        page,
        configurations,
        diagnostics,
    })
}

fn handle_expand(value: &str, site_path: Option<&Path>, page: i64) -> Result<Report> {
    let expander = match site_path {
        Some(path) => expander_for(&load_site(path)?)?,
        None => ParameterExpander::new(
            Arc::new(InMemoryPageTree::new()),
            Arc::new(InMemoryRecordStore::new()),
        ),
    };

    let mut spec = ParameterSpec::new();
    spec.insert("value".to_string(), value.to_string());
    let mut cache = ExpansionCache::new();
    let mut diagnostics = Diagnostics::new();
    let mut expanded = expander.expand(&spec, page, &mut cache, &mut diagnostics);

    Ok(Report::Expanded {
        values: expanded.shift_remove("value").unwrap_or_default(),
        diagnostics,
    })
}

fn handle_exclude(site_path: &Path, list: &str) -> Result<Report> {
    let site = load_site(site_path)?;
    let mut cache = ExpansionCache::new();
    let ids = expand_exclude_string(list, &site.page_tree(), &mut cache);
    Ok(Report::Excluded { pages: ids })
}
