//! Configuration and backend factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use neetprep_core::bank::DEFAULT_GROUP_SIZE;
use neetprep_core::recommend::WEAK_THRESHOLD;
use neetprep_core::traits::{AuthProvider, HistoryStore, QuestionBank};

use crate::auth::StaticAuth;
use crate::file::FileStore;
use crate::firebase::FirebaseStore;
use crate::memory::MemoryStore;

/// Where questions come from and results go.
///
/// Note: Custom Debug impl masks the auth token.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Firebase {
        database_url: String,
        #[serde(default)]
        auth_token: Option<String>,
    },
    File {
        #[serde(default = "default_data_dir")]
        root: PathBuf,
    },
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Firebase {
                database_url,
                auth_token,
            } => f
                .debug_struct("Firebase")
                .field("database_url", database_url)
                .field("auth_token", &auth_token.as_ref().map(|_| "***"))
                .finish(),
            StoreConfig::File { root } => f.debug_struct("File").field("root", root).finish(),
            StoreConfig::Memory => f.write_str("Memory"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            root: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./neetprep-data")
}

/// Top-level neetprep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeetprepConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Signed-in learner. Results are not saved without one.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Chapters averaging below this percentage are recommended.
    #[serde(default = "default_weak_threshold")]
    pub weak_threshold: f64,
    /// Questions drawn for group and all-chapters tests.
    #[serde(default = "default_group_question_count")]
    pub group_question_count: usize,
    /// Where reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_weak_threshold() -> f64 {
    WEAK_THRESHOLD
}
fn default_group_question_count() -> usize {
    DEFAULT_GROUP_SIZE
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./neetprep-results")
}

impl Default for NeetprepConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            user_id: None,
            weak_threshold: default_weak_threshold(),
            group_question_count: default_group_question_count(),
            output_dir: default_output_dir(),
        }
    }
}

impl NeetprepConfig {
    /// Sign-in provider for the configured user.
    pub fn auth(&self) -> Arc<dyn AuthProvider> {
        Arc::new(StaticAuth::new(self.user_id.clone()))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        // Values are inserted verbatim, never expanded again.
        from = start + value.len();
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Firebase {
            database_url,
            auth_token,
        } => StoreConfig::Firebase {
            database_url: resolve_env_vars(database_url),
            auth_token: auth_token
                .as_deref()
                .map(resolve_env_vars)
                .filter(|t| !t.is_empty()),
        },
        StoreConfig::File { root } => StoreConfig::File {
            root: PathBuf::from(resolve_env_vars(&root.to_string_lossy())),
        },
        StoreConfig::Memory => StoreConfig::Memory,
    }
}

/// Apply `NEETPREP_DATABASE_URL`, `NEETPREP_AUTH_TOKEN` and
/// `NEETPREP_USER_ID` on top of the file settings.
fn apply_overrides(config: &mut NeetprepConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("NEETPREP_DATABASE_URL") {
        let auth_token = match &config.store {
            StoreConfig::Firebase { auth_token, .. } => auth_token.clone(),
            _ => None,
        };
        config.store = StoreConfig::Firebase {
            database_url: url,
            auth_token,
        };
    }

    if let Some(token) = var("NEETPREP_AUTH_TOKEN") {
        if let StoreConfig::Firebase { auth_token, .. } = &mut config.store {
            *auth_token = Some(token);
        }
    }

    if let Some(user_id) = var("NEETPREP_USER_ID") {
        config.user_id = Some(user_id);
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `neetprep.toml` in the current directory
/// 2. `~/.config/neetprep/config.toml`
///
/// An explicit `path` must exist and skips the search. Environment variable
/// overrides: `NEETPREP_DATABASE_URL`, `NEETPREP_AUTH_TOKEN`,
/// `NEETPREP_USER_ID`.
pub fn load_config_from(path: Option<&Path>) -> Result<NeetprepConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("neetprep.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => NeetprepConfig::default(),
    };

    apply_overrides(&mut config, |name| {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    });
    config.store = resolve_store_config(&config.store);
    config.user_id = config
        .user_id
        .as_deref()
        .map(resolve_env_vars)
        .filter(|u| !u.is_empty());

    Ok(config)
}

/// Parse and check a configuration document.
pub fn parse_config(content: &str) -> Result<NeetprepConfig> {
    let config: NeetprepConfig = toml::from_str(content)?;
    if !(0.0..=100.0).contains(&config.weak_threshold) {
        anyhow::bail!(
            "weak_threshold must be between 0 and 100, got {}",
            config.weak_threshold
        );
    }
    if config.group_question_count == 0 {
        anyhow::bail!("group_question_count must be at least 1");
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("neetprep"))
}

/// The question bank and history store behind one configured backend.
#[derive(Clone)]
pub struct Backend {
    pub name: &'static str,
    pub bank: Arc<dyn QuestionBank>,
    pub history: Arc<dyn HistoryStore>,
}

/// Create the backend described by `config`.
pub fn create_store(config: &StoreConfig) -> Result<Backend> {
    match config {
        StoreConfig::Firebase {
            database_url,
            auth_token,
        } => {
            let store = Arc::new(
                FirebaseStore::new(database_url, auth_token.clone())
                    .context("failed to create Firebase store")?,
            );
            Ok(Backend {
                name: "firebase",
                bank: store.clone(),
                history: store,
            })
        }
        StoreConfig::File { root } => {
            let store = Arc::new(FileStore::new(root));
            Ok(Backend {
                name: "file",
                bank: store.clone(),
                history: store,
            })
        }
        StoreConfig::Memory => {
            let store = Arc::new(MemoryStore::new());
            Ok(Backend {
                name: "memory",
                bank: store.clone(),
                history: store,
            })
        }
    }
}
