//! Subcommand implementations.

pub mod chapters;
pub mod history;
pub mod init;
pub mod progress;
pub mod recommend;
pub mod take;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};

use neetprep_core::model::ScoreRecord;
use neetprep_core::persist::ResultPersister;
use neetprep_store::config::{create_store, load_config_from, Backend, NeetprepConfig};

/// Configuration plus the backend it selects.
pub(crate) fn open(config_path: Option<PathBuf>) -> Result<(NeetprepConfig, Backend)> {
    let config = load_config_from(config_path.as_deref())?;
    tracing::debug!(store = ?config.store, "configuration loaded");
    let backend = create_store(&config.store)?;
    Ok((config, backend))
}

/// The signed-in user's id and every record they have saved.
pub(crate) async fn load_history(
    config: &NeetprepConfig,
    backend: &Backend,
) -> Result<(String, Vec<ScoreRecord>)> {
    let user_id = config
        .auth()
        .current_user_id()
        .context("not signed in: set user_id in neetprep.toml or NEETPREP_USER_ID")?;
    let persister = ResultPersister::new(backend.history.clone(), config.auth());
    let records = persister
        .history()
        .await
        .with_context(|| format!("failed to read history from the {} store", backend.name))?;
    Ok((user_id, records))
}
