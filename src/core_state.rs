//! Shared application state.
//!
//! `CoreState` is built once at startup and wrapped in `Arc`. Request
//! handlers open their own SQLite connection through [`CoreState::open_db`];
//! the realtime broker is the only in-memory state shared between requests.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::db;
use crate::realtime::{PracticeFeed, RealtimeBroker};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    settings: Settings,
    broker: Arc<RealtimeBroker>,
    feed: PracticeFeed,
}

impl CoreState {
    pub fn new(settings: Settings) -> Self {
        let broker = Arc::new(RealtimeBroker::new());
        let feed = PracticeFeed::new(broker.clone(), &settings.practice_id);
        Self {
            settings,
            broker,
            feed,
        }
    }

    /// Creates the database directory and applies migrations.
    ///
    /// Called once at startup so request handlers never race on schema setup.
    pub fn initialize(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.settings.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CoreError::DataDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let conn = db::open_database(&self.settings.database_path)?;
        let version = db::get_current_version(&conn);
        tracing::info!(
            path = %self.settings.database_path.display(),
            schema_version = version,
            "Database ready"
        );
        Ok(())
    }

    /// Open a fresh connection to the practice database.
    ///
    /// Assumes [`CoreState::initialize`] has already migrated the schema.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_connection(&self.settings.database_path).map_err(CoreError::Database)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Feed bound to the configured practice channel.
    pub fn feed(&self) -> &PracticeFeed {
        &self.feed
    }

    /// Feed for an arbitrary practice (realtime subscribers may name their own).
    pub fn feed_for(&self, practice_id: &str) -> PracticeFeed {
        PracticeFeed::new(self.broker.clone(), practice_id)
    }
}

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Cannot create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
