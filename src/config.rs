use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "HealthDash";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Duration used when an appointment type cannot be found.
pub const DEFAULT_APPOINTMENT_DURATION_MIN: i64 = 30;

/// Smallest default duration accepted when creating or editing a type.
pub const MIN_TYPE_DURATION_MIN: i64 = 5;

/// Largest default duration accepted for a type (one day).
pub const MAX_TYPE_DURATION_MIN: i64 = 24 * 60;

/// Audit log entries per page.
pub const AUDIT_PAGE_SIZE: i64 = 30;

/// Practice id used for the realtime channel when none is configured.
pub const DEFAULT_PRACTICE_ID: &str = "default";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3043";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "healthdash=info,healthdash_lib=info,tower_http=info"
}

/// Get the application data directory (~/HealthDash/).
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the scheduling database.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("schedule.db")
}

/// Runtime settings, read from `HEALTHDASH_*` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub practice_id: String,
    /// When set, requests without actor headers run as a demo administrator.
    pub demo_mode: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("HEALTHDASH_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let bind_raw = lookup("HEALTHDASH_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "HEALTHDASH_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let practice_id = lookup("HEALTHDASH_PRACTICE_ID")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PRACTICE_ID.into());

        let demo_mode = match lookup("HEALTHDASH_DEMO_MODE").as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "HEALTHDASH_DEMO_MODE",
                    value: other.into(),
                })
            }
        };

        Ok(Self {
            database_path,
            bind_addr,
            practice_id,
            demo_mode,
        })
    }
}
