//! Shared application state.
//!
//! `CoreState` is wrapped in `Arc` at startup and handed to every
//! dashboard service. The session (logged-in user) sits behind a
//! `RwLock`: most operations only read it, login and logout write it.
//! Database connections are opened per operation.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::config::{self, ConfigError, PrismConfig};
use crate::db::{self, repository};
use crate::models::enums::Role;
use crate::models::User;
use crate::platform::Platform;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    /// Directory holding the database and `config.json`.
    pub data_dir: PathBuf,
    pub config: PrismConfig,
    platform: Platform,
    /// Logged-in user. `None` until login or session restore.
    session: RwLock<Option<User>>,
}

impl CoreState {
    pub fn new(data_dir: PathBuf, config: PrismConfig, platform: Platform) -> Self {
        Self {
            data_dir,
            config,
            platform,
            session: RwLock::new(None),
        }
    }

    /// State rooted at `~/PRISM`, with `config.json` applied when present.
    pub fn open_default(platform: Platform) -> Result<Self, CoreError> {
        Self::open_in(config::app_data_dir(), platform)
    }

    /// State rooted at `data_dir`, created if missing.
    pub fn open_in(data_dir: PathBuf, platform: Platform) -> Result<Self, CoreError> {
        std::fs::create_dir_all(&data_dir)?;
        let config = PrismConfig::load(&data_dir)?;
        tracing::info!(data_dir = %data_dir.display(), "Core state initialised");
        Ok(Self::new(data_dir, config, platform))
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.config.database_file)
    }

    /// Open a database connection. Cheap enough to do per operation.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        ensure_dir(&self.data_dir)?;
        db::open_database(&self.db_path()).map_err(CoreError::Database)
    }

    // ── Session access (read path) ──────────────────────────

    /// The logged-in user (owned copy).
    pub fn current_user(&self) -> Result<Option<User>, CoreError> {
        let guard = self.session.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(guard.clone())
    }

    pub fn require_user(&self) -> Result<User, CoreError> {
        self.current_user()?.ok_or(CoreError::NoActiveSession)
    }

    /// The logged-in user, which must hold `role`.
    pub fn require_role(&self, role: Role) -> Result<User, CoreError> {
        let user = self.require_user()?;
        if user.role != role {
            return Err(CoreError::WrongRole {
                expected: role,
                actual: user.role,
            });
        }
        Ok(user)
    }

    pub fn is_logged_in(&self) -> bool {
        self.session
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    // ── Session mutation (write path) ───────────────────────

    /// Set the active session and persist it so a restart restores it.
    pub fn set_session(&self, user: User) -> Result<(), CoreError> {
        let conn = self.open_db()?;
        repository::set_current_user(&conn, &user)?;

        let mut guard = self.session.write().map_err(|_| CoreError::LockPoisoned)?;
        tracing::info!(user_id = %user.id, role = %user.role, "Session started");
        *guard = Some(user);
        Ok(())
    }

    /// Clear the in-memory and persisted session. Safe when logged out.
    pub fn clear_session(&self) -> Result<(), CoreError> {
        let conn = self.open_db()?;
        repository::clear_current_user(&conn)?;

        let mut guard = self.session.write().map_err(|_| CoreError::LockPoisoned)?;
        *guard = None;
        tracing::info!("Session cleared");
        Ok(())
    }

    /// Load the persisted session into memory (app startup).
    pub fn restore_session(&self) -> Result<Option<User>, CoreError> {
        let conn = self.open_db()?;
        let user = repository::get_current_user(&conn)?;

        let mut guard = self.session.write().map_err(|_| CoreError::LockPoisoned)?;
        *guard = user.clone();
        if let Some(u) = &user {
            tracing::info!(user_id = %u.id, "Session restored");
        }
        Ok(user)
    }
}

fn ensure_dir(dir: &Path) -> Result<(), CoreError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No user is logged in")]
    NoActiveSession,
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("This action requires a {expected} account, current user is a {actual}")]
    WrongRole { expected: Role, actual: Role },
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::*;
    use crate::models::NewUser;
    use crate::platform::testing::RecordingSpeech;

    /// A state rooted in a fresh temp dir. Keep the `TempDir` alive for
    /// the duration of the test.
    pub fn temp_state(platform: Platform) -> (Arc<CoreState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = CoreState::open_in(dir.path().to_path_buf(), platform).unwrap();
        (Arc::new(state), dir)
    }

    pub fn quiet_platform() -> (Platform, Arc<RecordingSpeech>) {
        use crate::platform::testing::*;
        fake_platform(
            ScriptedRecognizer::default(),
            None,
            FixedClock::at("2026-03-01", "08:00:00"),
        )
    }

    pub fn add_user(state: &CoreState, role: Role, name: &str) -> User {
        let conn = state.open_db().unwrap();
        repository::insert_user(
            &conn,
            &NewUser {
                role,
                full_name: name.into(),
                voice_login_name: name.to_lowercase().replace(' ', ""),
                age: Some(68),
                gender: Some("male".into()),
                hospital_contact: None,
                specialization: None,
            },
        )
        .unwrap()
    }

    /// Insert a user and make them the logged-in session.
    pub fn login_as(state: &CoreState, role: Role, name: &str) -> User {
        let user = add_user(state, role, name);
        state.set_session(user.clone()).unwrap();
        user
    }
}
