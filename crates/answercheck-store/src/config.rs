//! Configuration loading and store factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use answercheck_core::engine::RecheckConfig;
use answercheck_core::grader::GraderConfig;
use answercheck_core::model::Subject;
use answercheck_core::numeric::NumericMode;
use answercheck_core::policy::OrderingPolicy;
use answercheck_core::text::TextNormalization;
use answercheck_core::traits::{RecheckStore, DEFAULT_PAGE_SIZE};

use crate::logging::LoggingStore;
use crate::memory::InMemoryStore;
use crate::postgrest::{PostgrestStore, DEFAULT_TIMEOUT_SECS};

/// Where submissions and the task catalog live.
///
/// Note: Custom Debug impl masks the API key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Postgrest {
        url: String,
        api_key: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    /// A JSON snapshot read into an [`InMemoryStore`].
    File { path: PathBuf },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Postgrest {
                url,
                api_key: _,
                timeout_secs,
            } => f
                .debug_struct("Postgrest")
                .field("url", url)
                .field("api_key", &"***")
                .field("timeout_secs", timeout_secs)
                .finish(),
            StoreConfig::File { path } => f.debug_struct("File").field("path", path).finish(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level answercheck configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswercheckConfig {
    /// Backing store for `recheck`.
    #[serde(default)]
    pub store: Option<StoreConfig>,
    /// Subjects rechecked when none are named on the command line.
    #[serde(default = "default_subjects")]
    pub subjects: Vec<Subject>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Upper bound on rows read per subject.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Pause after each update in milliseconds.
    #[serde(default)]
    pub update_delay_ms: u64,
    /// Max retries on transient store errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub text_normalization: TextNormalization,
    #[serde(default)]
    pub numeric_mode: NumericMode,
    /// Replaces the built-in ordered-task table, keyed by subject code.
    #[serde(default)]
    pub ordered_tasks: Option<HashMap<String, Vec<u32>>>,
}

fn default_subjects() -> Vec<Subject> {
    Subject::ALL.to_vec()
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_max_rows() -> usize {
    20_000
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}

impl Default for AnswercheckConfig {
    fn default() -> Self {
        Self {
            store: None,
            subjects: default_subjects(),
            page_size: default_page_size(),
            max_rows: default_max_rows(),
            update_delay_ms: 0,
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            text_normalization: TextNormalization::default(),
            numeric_mode: NumericMode::default(),
            ordered_tasks: None,
        }
    }
}

impl AnswercheckConfig {
    /// Grader settings, validating any custom ordered-task table.
    pub fn grader_config(&self) -> Result<GraderConfig> {
        let policy = match &self.ordered_tasks {
            Some(table) => OrderingPolicy::from_table(table.clone())
                .context("invalid ordered_tasks table")?,
            None => OrderingPolicy::default(),
        };
        Ok(GraderConfig {
            policy,
            numeric_mode: self.numeric_mode,
            text_normalization: self.text_normalization,
        })
    }

    pub fn recheck_config(&self, dry_run: bool) -> RecheckConfig {
        RecheckConfig {
            page_size: self.page_size.max(1),
            max_rows: self.max_rows,
            update_delay: Duration::from_millis(self.update_delay_ms),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            dry_run,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(&rest[start + 2..start + len]).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Postgrest {
            url,
            api_key,
            timeout_secs,
        } => StoreConfig::Postgrest {
            url: resolve_env_vars(url),
            api_key: resolve_env_vars(api_key),
            timeout_secs: *timeout_secs,
        },
        StoreConfig::File { path } => StoreConfig::File {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `answercheck.toml` in the current directory
/// 2. `~/.config/answercheck/config.toml`
///
/// Environment variable overrides: `ANSWERCHECK_STORE_URL`, `ANSWERCHECK_STORE_KEY`.
pub fn load_config() -> Result<AnswercheckConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AnswercheckConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("answercheck.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AnswercheckConfig::default(),
    };

    apply_env_overrides(
        &mut config,
        std::env::var("ANSWERCHECK_STORE_URL").ok(),
        std::env::var("ANSWERCHECK_STORE_KEY").ok(),
    );

    config.store = config.store.as_ref().map(resolve_store_config);
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<AnswercheckConfig> {
    let config: AnswercheckConfig = toml::from_str(content)?;
    // Reject a bad ordered-task table at load time rather than on first use.
    config.grader_config()?;
    Ok(config)
}

/// A URL override switches the store to PostgREST; a key override only
/// replaces the key of an existing PostgREST store.
fn apply_env_overrides(
    config: &mut AnswercheckConfig,
    url: Option<String>,
    key: Option<String>,
) {
    if let Some(url) = url {
        match &mut config.store {
            Some(StoreConfig::Postgrest { url: existing, .. }) => *existing = url,
            _ => {
                config.store = Some(StoreConfig::Postgrest {
                    url,
                    api_key: String::new(),
                    timeout_secs: DEFAULT_TIMEOUT_SECS,
                })
            }
        }
    }

    if let (Some(key), Some(StoreConfig::Postgrest { api_key, .. })) = (key, &mut config.store) {
        *api_key = key;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("answercheck"))
}

/// Create a store instance from its configuration, wrapped in a [`LoggingStore`].
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn RecheckStore>> {
    let inner: Arc<dyn RecheckStore> = match config {
        StoreConfig::Postgrest {
            url,
            api_key,
            timeout_secs,
        } => {
            if url.is_empty() {
                anyhow::bail!("store url is empty");
            }
            Arc::new(PostgrestStore::with_timeout(url, api_key, *timeout_secs)?)
        }
        StoreConfig::File { path } => Arc::new(InMemoryStore::load_json(path)?),
    };
    Ok(Arc::new(LoggingStore::new(inner)))
}
