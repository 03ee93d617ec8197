//! Application configuration for discusskit.
//!
//! User config lives at `~/.discusskit/discusskit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DiscusskitError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "discusskit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".discusskit";

/// Number of ranked discussion documents kept per item.
///
/// Every kept document costs one inner-budget permit per item, so raising
/// this directly raises outbound request pressure.
pub const DEFAULT_TOP_K: usize = 5;

/// Items whose full fetch may be in flight at once.
pub const DEFAULT_ITEM_CONCURRENCY: usize = 3;

/// Discussion-document fetches in flight at once, across all items.
pub const DEFAULT_DOCUMENT_CONCURRENCY: usize = 20;

/// Per-request timeout applied by the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Config structs (matching discusskit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Paths used by both phases.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Download-phase budgets and HTTP client settings.
    #[serde(default)]
    pub fetch: FetchSection,

    /// Remote source location.
    #[serde(default)]
    pub source: SourceConfig,

    /// CSS selectors used to extract content regions.
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Catalog metadata JSON file.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Directory holding `{id}.{slug}.txt` artifacts.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Root directory for `tags/` and `companies/` bundles.
    #[serde(default = "default_bundle_root")]
    pub bundle_root: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            artifact_dir: default_artifact_dir(),
            bundle_root: default_bundle_root(),
        }
    }
}

fn default_catalog_path() -> String {
    "problems.json".into()
}
fn default_artifact_dir() -> String {
    ".".into()
}
fn default_bundle_root() -> String {
    ".".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Outer budget: items fetched concurrently.
    #[serde(default = "default_item_concurrency")]
    pub item_concurrency: usize,

    /// Inner budget: discussion documents fetched concurrently, shared by all items.
    #[serde(default = "default_document_concurrency")]
    pub document_concurrency: usize,

    /// Groups merged concurrently.
    #[serde(default = "default_group_concurrency")]
    pub group_concurrency: usize,

    /// Ranked discussion documents kept per item.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            item_concurrency: default_item_concurrency(),
            document_concurrency: default_document_concurrency(),
            group_concurrency: default_group_concurrency(),
            top_k: default_top_k(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_item_concurrency() -> usize {
    DEFAULT_ITEM_CONCURRENCY
}
fn default_document_concurrency() -> usize {
    DEFAULT_DOCUMENT_CONCURRENCY
}
fn default_group_concurrency() -> usize {
    4
}
fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_user_agent() -> String {
    concat!("discusskit/", env!("CARGO_PKG_VERSION")).into()
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Origin of the remote source, e.g. `https://leetcode.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://leetcode.com".into()
}

/// `[selectors]` section.
///
/// These track the source's markup and are the first thing to update when
/// extraction starts failing with parse errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Item title on the discussion listing page.
    #[serde(default = "default_listing_title")]
    pub listing_title: String,
    /// One repeated discussion entry on the listing page.
    #[serde(default = "default_listing_entry")]
    pub listing_entry: String,
    /// Entry title, relative to `listing_entry`.
    #[serde(default = "default_entry_title")]
    pub entry_title: String,
    /// Entry link (`href`), relative to `listing_entry`.
    #[serde(default = "default_entry_link")]
    pub entry_link: String,
    /// Content region of a discussion document.
    #[serde(default = "default_document_content")]
    pub document_content: String,
    /// Content region of an item description.
    #[serde(default = "default_description_content")]
    pub description_content: String,
    /// Group page title.
    #[serde(default = "default_group_title")]
    pub group_title: String,
    /// One repeated item row on a group page.
    #[serde(default = "default_group_entry")]
    pub group_entry: String,
    /// Item link inside a group row; also used for its title.
    #[serde(default = "default_group_entry_link")]
    pub group_entry_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_title: default_listing_title(),
            listing_entry: default_listing_entry(),
            entry_title: default_entry_title(),
            entry_link: default_entry_link(),
            document_content: default_document_content(),
            description_content: default_description_content(),
            group_title: default_group_title(),
            group_entry: default_group_entry(),
            group_entry_link: default_group_entry_link(),
        }
    }
}

fn default_listing_title() -> String {
    ".title__27Kb".into()
}
fn default_listing_entry() -> String {
    ".topic-item-wrap__2FSZ".into()
}
fn default_entry_title() -> String {
    ".topic-title__3LYM".into()
}
fn default_entry_link() -> String {
    ".title-link__1ay5".into()
}
fn default_document_content() -> String {
    ".discuss-markdown-container".into()
}
fn default_description_content() -> String {
    r#"div[data-track-load="description_content"]"#.into()
}
fn default_group_title() -> String {
    "title".into()
}
fn default_group_entry() -> String {
    r#"[role="row"]"#.into()
}
fn default_group_entry_link() -> String {
    r#"a[href*="/problems/"]"#.into()
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Outer budget size.
    pub item_concurrency: usize,
    /// Inner budget size, shared across all items.
    pub document_concurrency: usize,
    /// Concurrent group merges.
    pub group_concurrency: usize,
    /// Ranked documents kept per item.
    pub top_k: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Remote source origin.
    pub base_url: Url,
}

impl FetchConfig {
    /// Derive the runtime config, validating budgets and the base URL.
    pub fn from_app(config: &AppConfig) -> Result<Self> {
        validate(config)?;
        let base_url = parse_base_url(&config.source.base_url)?;
        Ok(Self {
            item_concurrency: config.fetch.item_concurrency,
            document_concurrency: config.fetch.document_concurrency,
            group_concurrency: config.fetch.group_concurrency,
            top_k: config.fetch.top_k,
            request_timeout: Duration::from_secs(config.fetch.request_timeout_secs),
            user_agent: config.fetch.user_agent.clone(),
            base_url,
        })
    }
}

/// Check value ranges that serde cannot express.
pub fn validate(config: &AppConfig) -> Result<()> {
    let fetch = &config.fetch;
    for (name, value) in [
        ("item_concurrency", fetch.item_concurrency),
        ("document_concurrency", fetch.document_concurrency),
        ("group_concurrency", fetch.group_concurrency),
        ("top_k", fetch.top_k),
    ] {
        if value == 0 {
            return Err(DiscusskitError::config(format!(
                "fetch.{name} must be at least 1"
            )));
        }
    }
    if fetch.request_timeout_secs == 0 {
        return Err(DiscusskitError::config(
            "fetch.request_timeout_secs must be at least 1",
        ));
    }
    parse_base_url(&config.source.base_url)?;
    Ok(())
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| DiscusskitError::config(format!("invalid source.base_url '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(DiscusskitError::config(format!(
            "source.base_url '{raw}' must be an http(s) URL with a host"
        )));
    }
    Ok(url)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.discusskit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DiscusskitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.discusskit/discusskit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DiscusskitError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DiscusskitError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DiscusskitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DiscusskitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DiscusskitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
