//! Merges inline page configuration and persisted configuration records
//! into compiled configurations for one page.
use crate::access::{csv, BackendUser};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::expand::{expand_exclude_string, ExpansionCache, ParameterExpander};
use crate::pages::PageId;
use indexmap::IndexMap;
use pagecrawl_config::{ExtensionSettings, SettingsTree};
use pagecrawl_urls::{
    explode_query, ExpandedParameters, ParameterSpec, QueryStringCompiler, UrlCompiler,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::instrument;

/// Where inline parameter sets live in the page configuration tree.
pub const INLINE_CONFIG_PATH: &str = "tx_crawler.crawlerCfg.paramSets";

pub type Configurations = IndexMap<String, CompiledConfiguration>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Inline page configuration.
    PageTs,
    /// Persisted configuration record with this uid.
    Record(i64),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::PageTs => f.write_str("pagets"),
            Origin::Record(uid) => write!(f, "tx_crawler_configuration_{uid}"),
        }
    }
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Settings attached to one named parameter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubConfiguration {
    pub key: String,
    pub proc_instr_filter: String,
    pub proc_instr_params: serde_yaml::Value,
    pub pids_only: String,
    pub base_url: String,
    pub force_ssl: bool,
    pub user_groups: String,
    pub exclude: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledConfiguration {
    pub sub_cfg: SubConfiguration,
    pub param_parsed: ParameterSpec,
    pub param_expanded: ExpandedParameters,
    pub origin: Origin,
    pub urls: Vec<String>,
}

/// A persisted crawler configuration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationRecord {
    pub uid: i64,
    pub pid: PageId,
    pub name: String,
    /// Parameter string, i.e. `&L=[0-2]`.
    pub configuration: String,
    /// Backend groups allowed to use the record; empty means everyone.
    pub begroups: String,
    pub pidsonly: String,
    pub processing_instruction_filter: String,
    pub processing_instruction_parameters_ts: String,
    pub base_url: String,
    #[serde(deserialize_with = "flexible_bool")]
    pub force_ssl: bool,
    pub fegroups: String,
    pub exclude: String,
    #[serde(deserialize_with = "flexible_bool")]
    pub hidden: bool,
    #[serde(deserialize_with = "flexible_bool")]
    pub deleted: bool,
}

/// Accepts `true`/`false` as well as the `0`/`1` integers of the database.
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
        Flag::Text(s) => !matches!(s.trim(), "" | "0" | "false"),
    })
}

/// Everything one resolution call needs to know about the page.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub page_id: PageId,
    /// Mount point appended as `&MP=` to inline base URLs.
    pub mount_point: Option<&'a str>,
    pub page_config: &'a SettingsTree,
    /// Configuration records found on the page's root line.
    pub records: &'a [ConfigurationRecord],
    pub user: &'a BackendUser,
}

pub struct ConfigurationResolver {
    expander: ParameterExpander,
    compiler: Box<dyn UrlCompiler + Send + Sync>,
    settings: ExtensionSettings,
}

impl fmt::Debug for ConfigurationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationResolver")
            .field("expander", &self.expander)
            .field("settings", &self.settings)
            .finish()
    }
}

impl ConfigurationResolver {
    pub fn new(expander: ParameterExpander, settings: ExtensionSettings) -> Self {
        Self {
            expander,
            compiler: Box::new(QueryStringCompiler),
            settings,
        }
    }

    pub fn with_compiler(mut self, compiler: impl UrlCompiler + Send + Sync + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    pub fn settings(&self) -> &ExtensionSettings {
        &self.settings
    }

    /// Inline configuration first, then persisted records; a name already
    /// taken by the inline source is never replaced.
    #[instrument(skip_all, fields(page_id = request.page_id))]
    pub fn resolve(
        &self,
        request: &ResolveRequest<'_>,
        cache: &mut ExpansionCache,
        diagnostics: &mut Diagnostics,
    ) -> Configurations {
        let res = self.from_page_config(
            request.page_config,
            request.page_id,
            request.mount_point,
            Configurations::new(),
            cache,
            diagnostics,
        );
        let res = self.from_records(
            request.records,
            request.page_id,
            request.user,
            res,
            cache,
            diagnostics,
        );
        tracing::info!(
            configurations = res.len(),
            urls = res.values().map(|c| c.urls.len()).sum::<usize>(),
            "page resolved"
        );
        res
    }

    /// Adds every inline parameter set that applies to `page_id`.
    pub fn from_page_config(
        &self,
        page_config: &SettingsTree,
        page_id: PageId,
        mount_point: Option<&str>,
        mut res: Configurations,
        cache: &mut ExpansionCache,
        diagnostics: &mut Diagnostics,
    ) -> Configurations {
        for key in page_config.child_names(INLINE_CONFIG_PATH) {
            let path = format!("{INLINE_CONFIG_PATH}.{key}");
            let setting = |name: &str| page_config.value(&format!("{path}.{name}"));

            let pids_only = setting("pidsOnly").unwrap_or_default();
            if !applies_to_page(&pids_only, page_id) {
                tracing::debug!(config = %key, "not configured for this page");
                continue;
            }

            let sub_cfg = SubConfiguration {
                key: key.clone(),
                proc_instr_filter: normalize_list(&setting("procInstrFilter").unwrap_or_default()),
                proc_instr_params: page_config
                    .node(&format!("{path}.procInstrParams"))
                    .map(|node| serde_yaml::Value::Mapping(node.clone()))
                    .unwrap_or_default(),
                pids_only,
                base_url: setting("baseUrl").unwrap_or_default(),
                force_ssl: setting("force_ssl").is_some_and(|v| !matches!(v.trim(), "" | "0")),
                user_groups: setting("userGroups").unwrap_or_default(),
                exclude: setting("exclude").unwrap_or_default(),
            };

            let mut base_url = format!("?id={page_id}");
            if let Some(mp) = mount_point.filter(|mp| !mp.is_empty()) {
                base_url.push_str(&format!("&MP={mp}"));
            }

            let raw = page_config.value(&path).unwrap_or_default();
            let compiled = self.compile(sub_cfg, &raw, Origin::PageTs, base_url, page_id, cache, diagnostics);
            res.insert(key, compiled);
        }
        res
    }

    /// Adds persisted configuration records the user may use, unless their
    /// name is already taken or their exclusion list covers `page_id`.
    pub fn from_records(
        &self,
        records: &[ConfigurationRecord],
        page_id: PageId,
        user: &BackendUser,
        mut res: Configurations,
        cache: &mut ExpansionCache,
        diagnostics: &mut Diagnostics,
    ) -> Configurations {
        for record in records {
            let context = format!("config:{}", record.name);
            if !user.may_use(&record.begroups) {
                diagnostics.record(
                    DiagnosticKind::AccessDenied,
                    context,
                    format!(
                        "record {} requires one of the groups `{}`",
                        record.uid, record.begroups
                    ),
                );
                continue;
            }
            if !applies_to_page(&record.pidsonly, page_id) {
                tracing::debug!(config = %record.name, "not configured for this page");
                continue;
            }
            if res.contains_key(&record.name) {
                tracing::debug!(config = %record.name, "name already configured, keeping earlier entry");
                continue;
            }

            let parsed = SettingsTree::parse(&record.processing_instruction_parameters_ts);
            for issue in &parsed.issues {
                diagnostics.record(
                    DiagnosticKind::MalformedProcessingInstructions,
                    context.clone(),
                    format!("line {}: {}", issue.line, issue.message),
                );
            }

            let excluded = expand_exclude_string(&record.exclude, self.expander.pages(), cache);
            if excluded.contains(&page_id) {
                tracing::debug!(config = %record.name, "page excluded by configuration");
                continue;
            }

            let sub_cfg = SubConfiguration {
                key: record.name.clone(),
                proc_instr_filter: record.processing_instruction_filter.clone(),
                proc_instr_params: parsed.tree.to_value(),
                pids_only: record.pidsonly.clone(),
                base_url: record.base_url.clone(),
                force_ssl: record.force_ssl,
                user_groups: record.fegroups.clone(),
                exclude: record.exclude.clone(),
            };
            let compiled = self.compile(
                sub_cfg,
                &record.configuration,
                Origin::Record(record.uid),
                format!("?id={page_id}"),
                page_id,
                cache,
                diagnostics,
            );
            res.insert(record.name.clone(), compiled);
        }
        res
    }

    #[allow(clippy::too_many_arguments)]
    fn compile(
        &self,
        sub_cfg: SubConfiguration,
        raw: &str,
        origin: Origin,
        base_url: String,
        page_id: PageId,
        cache: &mut ExpansionCache,
        diagnostics: &mut Diagnostics,
    ) -> CompiledConfiguration {
        let param_parsed = explode_query(raw);
        let param_expanded = self.expander.expand(&param_parsed, page_id, cache, diagnostics);

        let max_urls = self.settings.max_compile_urls;
        let combinations = param_expanded
            .values()
            .fold(1usize, |acc, values| acc.saturating_mul(values.len()));
        if combinations > max_urls {
            diagnostics.record(
                DiagnosticKind::CapExceeded,
                format!("config:{}", sub_cfg.key),
                format!("{combinations} URL combinations, keeping the first {max_urls}"),
            );
        }
        let urls = self.compiler.compile(&param_expanded, vec![base_url], max_urls);

        CompiledConfiguration {
            sub_cfg,
            param_parsed,
            param_expanded,
            origin,
            urls,
        }
    }
}

/// Keeps only configurations named in `allowed`; an empty list keeps all.
pub fn retain_allowed(allowed: &[String], mut configurations: Configurations) -> Configurations {
    if !allowed.is_empty() {
        configurations.retain(|name, _| allowed.contains(name));
    }
    configurations
}

/// An empty page list applies everywhere.
fn applies_to_page(pids_only: &str, page_id: PageId) -> bool {
    pids_only.is_empty() || csv(pids_only).any(|pid| pid == page_id.to_string())
}

fn normalize_list(list: &str) -> String {
    list.split(',').map(str::trim).collect::<Vec<_>>().join(",")
}
