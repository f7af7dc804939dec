//! Process-wide application state shared by every request.
//!
//! Handlers open their own SQLite connection per request through
//! [`CoreState::open_db`]; nothing else is shared or locked.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::config::{AppConfig, ConfigError};
use crate::crypto::hash_password;
use crate::db::{self, DatabaseError};
use crate::models::{NewUser, UserRole, Validate, ValidationError};

pub struct CoreState {
    pub config: AppConfig,
    db_path: PathBuf,
}

impl CoreState {
    pub fn new(config: AppConfig) -> Self {
        let db_path = config.database.path.clone();
        Self { config, db_path }
    }

    /// State over an explicit database file, defaults elsewhere.
    pub fn with_database(path: &Path) -> Self {
        let mut config = AppConfig::default();
        config.database.path = path.to_path_buf();
        Self::new(config)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection with pragmas applied and migrations current.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    /// Seed the configured admin when no user exists yet. Returns whether
    /// an account was created.
    pub fn bootstrap_admin(&self) -> Result<bool, CoreError> {
        let (Some(email), Some(password)) = (
            self.config.auth.bootstrap_admin_email.as_deref(),
            self.config.auth.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(false);
        };

        let conn = self.open_db()?;
        if db::count_users(&conn)? > 0 {
            return Ok(false);
        }

        let new = NewUser {
            email: email.to_string(),
            name: "Administrator".into(),
            role: UserRole::Admin,
            password: password.to_string(),
        };
        new.validate()?;
        let user = db::insert_user(&conn, &new, &hash_password(&new.password))?;
        tracing::info!(user_id = %user.id, email = %user.email, "Bootstrap admin created");
        Ok(true)
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid bootstrap admin: {0}")]
    Bootstrap(#[from] ValidationError),
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_admin(dir: &Path) -> CoreState {
        let mut state = CoreState::with_database(&dir.join("desk.db"));
        state.config.auth.bootstrap_admin_email = Some("Admin@Example.com".into());
        state.config.auth.bootstrap_admin_password = Some("long-enough-secret".into());
        state
    }

    #[test]
    fn open_db_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let state = CoreState::with_database(&dir.path().join("nested").join("desk.db"));
        let conn = state.open_db().unwrap();
        assert!(db::count_tables(&conn).unwrap() > 10);
        assert!(state.db_path().exists());
    }

    #[test]
    fn bootstrap_admin_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_admin(dir.path());
        assert!(state.bootstrap_admin().unwrap());
        assert!(!state.bootstrap_admin().unwrap());

        let conn = state.open_db().unwrap();
        let (user, _) = db::get_user_credentials(&conn, "admin@example.com").unwrap().unwrap();
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn bootstrap_is_skipped_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let state = CoreState::with_database(&dir.path().join("desk.db"));
        assert!(!state.bootstrap_admin().unwrap());
    }

    #[test]
    fn core_error_display() {
        let err = CoreError::Database(DatabaseError::not_found("user", "x"));
        assert!(err.to_string().contains("user"));
    }
}
