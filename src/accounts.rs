//! Account creation and voice login.
//!
//! The voice login name is a bare identifier: whatever the recogniser
//! hears, lower-cased with all whitespace removed, is matched against
//! stored names.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core_state::{CoreError, CoreState};
use crate::db::{repository, DatabaseError};
use crate::models::enums::Role;
use crate::models::{NewEmergencyContact, NewRelationship, NewUser, User};
use crate::platform::PlatformError;

pub const LOGIN_WELCOME: &str = "Welcome to PRISM for Blind, a Platform for Remote Integrated Smart Monitoring. Please tap the microphone button to begin voice login.";
pub const LOGIN_PROMPT: &str = "Voice recognition started. Please say your unique name.";
pub const LOGIN_HEARD: &str = "Voice recognized. Logging you in.";
pub const LOGIN_NOT_RECOGNIZED: &str = "Voice name not recognized. Please try again.";
pub const LOGIN_FAILED: &str = "An error occurred. Please try again.";
pub const LOGOUT_MESSAGE: &str = "Logging out. Goodbye.";

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Voice login name '{0}' is already taken")]
    VoiceNameTaken(String),
    #[error("Voice recognition failed: {0}")]
    Recognition(#[from] PlatformError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Lower-case and strip every whitespace character.
pub fn normalize_voice_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub role: Role,
    pub full_name: String,
    pub voice_login_name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub hospital_contact: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    /// Patients only: doctors to link the new account to.
    #[serde(default)]
    pub doctor_ids: Vec<Uuid>,
    /// Patients only: incomplete rows are skipped.
    #[serde(default)]
    pub emergency_contacts: Vec<NewEmergencyContact>,
}

/// Doctors a new patient can pick from.
pub fn list_doctors(state: &CoreState) -> Result<Vec<User>, AccountError> {
    let conn = state.open_db()?;
    Ok(repository::get_doctors(&conn)?)
}

pub fn create_account(state: &CoreState, request: &CreateAccountRequest) -> Result<User, AccountError> {
    let full_name = request.full_name.trim();
    if full_name.is_empty() {
        return Err(AccountError::MissingField("full_name"));
    }
    let voice_name = normalize_voice_name(&request.voice_login_name);
    if voice_name.is_empty() {
        return Err(AccountError::MissingField("voice_login_name"));
    }

    let conn = state.open_db()?;
    if repository::get_user_by_voice_name(&conn, &voice_name)?.is_some() {
        return Err(AccountError::VoiceNameTaken(voice_name));
    }

    let user = repository::insert_user(
        &conn,
        &NewUser {
            role: request.role,
            full_name: full_name.to_string(),
            voice_login_name: voice_name,
            age: request.age,
            gender: request.gender.clone(),
            hospital_contact: request.hospital_contact.clone(),
            specialization: request.specialization.clone(),
        },
    )?;

    if user.role == Role::Patient {
        for doctor_id in &request.doctor_ids {
            repository::insert_relationship(
                &conn,
                &NewRelationship {
                    doctor_id: *doctor_id,
                    patient_id: user.id,
                },
            )?;
        }
        for contact in request.emergency_contacts.iter().filter(|c| c.is_complete()) {
            repository::insert_emergency_contact(&conn, &user.id, contact)?;
        }
    }
    tracing::info!(user_id = %user.id, role = %user.role, "Account created");

    state.platform().say(&format!(
        "Account successfully created for {}. Please proceed to login.",
        user.full_name
    ));
    Ok(user)
}

/// Where a successful login lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Patient,
    Doctor,
}

impl From<Role> for Dashboard {
    fn from(role: Role) -> Self {
        match role {
            Role::Patient => Self::Patient,
            Role::Doctor => Self::Doctor,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    LoggedIn { user: User, dashboard: Dashboard },
    /// No account for the normalised transcript.
    NotRecognized { heard: String },
}

pub fn welcome(state: &CoreState) {
    state.platform().say(LOGIN_WELCOME);
}

/// Listen for a spoken login name and start a session for it.
pub fn voice_login(state: &CoreState) -> Result<LoginOutcome, AccountError> {
    let platform = state.platform();
    platform.say(LOGIN_PROMPT);

    let transcript = match platform.recognizer.listen_once() {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "Voice login recognition failed");
            platform.say(LOGIN_FAILED);
            return Err(e.into());
        }
    };
    let heard = normalize_voice_name(&transcript);
    platform.say(LOGIN_HEARD);

    let conn = state.open_db()?;
    let Some(user) = repository::get_user_by_voice_name(&conn, &heard)? else {
        tracing::info!(%heard, "Voice name not recognised");
        platform.say(LOGIN_NOT_RECOGNIZED);
        return Ok(LoginOutcome::NotRecognized { heard });
    };

    state.set_session(user.clone())?;
    platform.say(&format!(
        "You are successfully logged into the system. Welcome {}.",
        user.full_name
    ));
    Ok(LoginOutcome::LoggedIn {
        dashboard: user.role.into(),
        user,
    })
}

pub fn logout(state: &CoreState) -> Result<(), AccountError> {
    state.platform().say(LOGOUT_MESSAGE);
    state.clear_session()?;
    Ok(())
}

/// Resume a persisted session at startup.
pub fn restore_session(state: &CoreState) -> Result<Option<Dashboard>, AccountError> {
    Ok(state.restore_session()?.map(|u| u.role.into()))
}
