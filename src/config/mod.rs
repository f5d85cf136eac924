//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheBackendKind;
use crate::domain::classify::DEFAULT_DISPLAY_PRIORITY;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "fundhub";
const DEFAULT_REMOTE_BASE_URL: &str = "https://api.webflow.com/v2";
const DEFAULT_ACCEPT_VERSION: &str = "1.0.0";
const DEFAULT_PAGE_SIZE: u32 = 100;
const MAX_PAGE_SIZE: u32 = fundhub_api_types::MAX_PAGE_SIZE;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONTRIBUTORS_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_MEMORY_CAPACITY: usize = 1024;
const DEFAULT_COLLECTION_TTL_SECS: u64 = 3 * 24 * 60 * 60;
const DEFAULT_STATS_TTL_SECS: u64 = 10 * 60;

/// Command-line arguments for the fundhub binary.
#[derive(Debug, Parser)]
#[command(
    name = "fundhub",
    version,
    about = "Cached, classified reads over the project collections"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FUNDHUB_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every published, non-hidden project.
    Projects,
    /// List the short form of every visible project.
    Summaries,
    /// Show one project with its contributors.
    Project {
        /// Project slug.
        slug: String,
    },
    /// Group visible projects into open, completed and bounty buckets.
    Buckets,
    /// Resolve a status option id of the projects collection to its label.
    StatusLabel {
        /// Option id as stored on project records.
        status_id: String,
    },
    /// FAQ entries of a project.
    Faqs {
        /// Project slug.
        slug: String,
    },
    /// Updates posted for a project.
    Updates {
        /// Project slug.
        slug: String,
    },
    /// Social posts that mention a project.
    Posts {
        /// Project slug.
        slug: String,
    },
    /// Site-wide totals.
    Stats,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the cache backend (memory|rest|none).
    #[arg(long = "cache-backend", value_name = "BACKEND", global = true)]
    pub cache_backend: Option<String>,

    /// Override the collection store base URL.
    #[arg(long = "remote-base-url", value_name = "URL", global = true)]
    pub remote_base_url: Option<String>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub remote: RemoteSettings,
    pub contributors: ContributorSettings,
    pub cache: CacheSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub base_url: String,
    /// Checked when the collection adapter is built.
    pub api_token: Option<String>,
    pub accept_version: String,
    pub page_size: u32,
    pub timeout: Duration,
    pub collections: CollectionIds,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionIds {
    pub projects: Option<String>,
    pub faqs: Option<String>,
    pub updates: Option<String>,
    pub posts: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContributorSettings {
    /// When false, project relations are left unresolved.
    pub enabled: bool,
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,
    pub memory_capacity: NonZeroUsize,
    pub rest_url: Option<String>,
    pub rest_token: Option<String>,
    pub collection_ttl: Duration,
    pub stats_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct DisplaySettings {
    /// Project names listed first in the open bucket, in order.
    pub priority: Vec<String>,
    /// Show every visible project as open when no status classifies.
    pub fallback_to_open: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FUNDHUB").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    remote: RawRemoteSettings,
    contributors: RawContributorSettings,
    cache: RawCacheSettings,
    display: RawDisplaySettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(backend) = overrides.cache_backend.as_ref() {
            self.cache.backend = Some(backend.clone());
        }
        if let Some(url) = overrides.remote_base_url.as_ref() {
            self.remote.base_url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            remote,
            contributors,
            cache,
            display,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            remote: build_remote_settings(remote)?,
            contributors: build_contributor_settings(contributors)?,
            cache: build_cache_settings(cache)?,
            display: build_display_settings(display),
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_remote_settings(remote: RawRemoteSettings) -> Result<RemoteSettings, LoadError> {
    let base_url = non_empty(remote.base_url)
        .unwrap_or_else(|| DEFAULT_REMOTE_BASE_URL.to_string());
    let accept_version = non_empty(remote.accept_version)
        .unwrap_or_else(|| DEFAULT_ACCEPT_VERSION.to_string());

    let page_size = remote.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(LoadError::invalid(
            "remote.page_size",
            format!("must be between 1 and {MAX_PAGE_SIZE}"),
        ));
    }

    let timeout = seconds(
        remote.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
        "remote.timeout_seconds",
    )?;

    let collections = CollectionIds {
        projects: non_empty(remote.collections.projects),
        faqs: non_empty(remote.collections.faqs),
        updates: non_empty(remote.collections.updates),
        posts: non_empty(remote.collections.posts),
    };

    Ok(RemoteSettings {
        base_url,
        api_token: non_empty(remote.api_token),
        accept_version,
        page_size,
        timeout,
        collections,
    })
}

fn build_contributor_settings(
    contributors: RawContributorSettings,
) -> Result<ContributorSettings, LoadError> {
    let timeout = seconds(
        contributors.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
        "contributors.timeout_seconds",
    )?;

    Ok(ContributorSettings {
        enabled: contributors.enabled.unwrap_or(true),
        base_url: non_empty(contributors.base_url)
            .unwrap_or_else(|| DEFAULT_CONTRIBUTORS_BASE_URL.to_string()),
        api_token: non_empty(contributors.api_token),
        timeout,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend = match cache.backend.as_deref().map(str::trim) {
        None | Some("") => CacheBackendKind::Memory,
        Some(value) => parse_backend(value)?,
    };

    let memory_capacity = NonZeroUsize::new(
        cache.memory_capacity.unwrap_or(DEFAULT_MEMORY_CAPACITY),
    )
    .ok_or_else(|| LoadError::invalid("cache.memory_capacity", "must be greater than zero"))?;

    let rest_url = non_empty(cache.rest_url);
    let rest_token = non_empty(cache.rest_token);
    if backend == CacheBackendKind::Rest {
        if rest_url.is_none() {
            return Err(LoadError::invalid(
                "cache.rest_url",
                "required when cache.backend is rest",
            ));
        }
        if rest_token.is_none() {
            return Err(LoadError::invalid(
                "cache.rest_token",
                "required when cache.backend is rest",
            ));
        }
    }

    Ok(CacheSettings {
        backend,
        memory_capacity,
        rest_url,
        rest_token,
        collection_ttl: seconds(
            cache.collection_ttl_secs.unwrap_or(DEFAULT_COLLECTION_TTL_SECS),
            "cache.collection_ttl_secs",
        )?,
        stats_ttl: seconds(
            cache.stats_ttl_secs.unwrap_or(DEFAULT_STATS_TTL_SECS),
            "cache.stats_ttl_secs",
        )?,
    })
}

fn build_display_settings(display: RawDisplaySettings) -> DisplaySettings {
    let priority = display.priority.unwrap_or_else(|| {
        DEFAULT_DISPLAY_PRIORITY
            .iter()
            .map(|name| name.to_string())
            .collect()
    });

    DisplaySettings {
        priority,
        fallback_to_open: display.fallback_to_open.unwrap_or(true),
    }
}

fn parse_backend(value: &str) -> Result<CacheBackendKind, LoadError> {
    [
        CacheBackendKind::Memory,
        CacheBackendKind::Rest,
        CacheBackendKind::None,
    ]
    .into_iter()
    .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    .ok_or_else(|| {
        LoadError::invalid(
            "cache.backend",
            format!("unknown backend `{value}` (expected memory, rest or none)"),
        )
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRemoteSettings {
    base_url: Option<String>,
    api_token: Option<String>,
    accept_version: Option<String>,
    page_size: Option<u32>,
    timeout_seconds: Option<u64>,
    collections: RawCollectionIds,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCollectionIds {
    projects: Option<String>,
    faqs: Option<String>,
    updates: Option<String>,
    posts: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContributorSettings {
    enabled: Option<bool>,
    base_url: Option<String>,
    api_token: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    memory_capacity: Option<usize>,
    rest_url: Option<String>,
    rest_token: Option<String>,
    collection_ttl_secs: Option<u64>,
    stats_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDisplaySettings {
    priority: Option<Vec<String>>,
    fallback_to_open: Option<bool>,
}
