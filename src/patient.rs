//! Patient dashboard actions other than SOS and medicines.

use thiserror::Error;

use crate::core_state::{CoreError, CoreState};
use crate::db::{repository, DatabaseError};
use crate::models::enums::Role;
use crate::models::{EmergencyContact, HealthCard, NewEmergencyContact, NewVoiceMessage, User, VoiceMessage};
use crate::platform::PlatformError;

pub const WELCOME_MESSAGE: &str = "Welcome to your patient dashboard. Top left button for voice health message. Top right button for S O S emergency. Bottom left button for medicine assistant. Bottom right button for object detection.";
pub const HEALTH_CARD_SAVED: &str = "Health card saved successfully.";
pub const CONTACT_SAVED: &str = "Emergency contact saved successfully.";
pub const RECORDING_STARTED: &str = "Voice recording started. Please describe how you feel today.";
pub const RECORDING_SENT: &str = "Voice recorded successfully and sent to your doctor.";
pub const NO_DOCTOR: &str = "No doctor assigned. Please contact support.";
pub const RECORDING_FAILED: &str = "Recording failed. Please try again.";

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Emergency contact needs a name, phone number and relationship")]
    IncompleteContact,
    #[error("Voice recording failed: {0}")]
    Recognition(#[from] PlatformError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

pub fn welcome(state: &CoreState) {
    state.platform().say(WELCOME_MESSAGE);
}

/// A stored health card, or one pre-filled from the account when the
/// patient has not saved one yet. The flag is `true` for a stored card.
pub fn load_health_card(state: &CoreState) -> Result<(HealthCard, bool), PatientError> {
    let patient = state.require_role(Role::Patient)?;
    let conn = state.open_db()?;
    match repository::get_health_card(&conn, &patient.id)? {
        Some(card) => Ok((card, true)),
        None => Ok((prefilled_card(&patient), false)),
    }
}

fn prefilled_card(user: &User) -> HealthCard {
    HealthCard {
        full_name: user.full_name.clone(),
        age: user.age.map(|a| a.to_string()).unwrap_or_default(),
        gender: user.gender.clone().unwrap_or_default(),
        ..Default::default()
    }
}

pub fn save_health_card(state: &CoreState, card: &HealthCard) -> Result<(), PatientError> {
    let patient = state.require_role(Role::Patient)?;
    let conn = state.open_db()?;
    repository::save_health_card(&conn, &patient.id, card)?;
    state.platform().say(HEALTH_CARD_SAVED);
    Ok(())
}

pub fn list_contacts(state: &CoreState) -> Result<Vec<EmergencyContact>, PatientError> {
    let patient = state.require_role(Role::Patient)?;
    let conn = state.open_db()?;
    Ok(repository::get_emergency_contacts_for_patient(&conn, &patient.id)?)
}

pub fn add_contact(
    state: &CoreState,
    contact: &NewEmergencyContact,
) -> Result<EmergencyContact, PatientError> {
    let patient = state.require_role(Role::Patient)?;
    if !contact.is_complete() {
        return Err(PatientError::IncompleteContact);
    }
    let conn = state.open_db()?;
    let saved = repository::insert_emergency_contact(&conn, &patient.id, contact)?;
    state.platform().say(CONTACT_SAVED);
    Ok(saved)
}

/// Record one spoken health update and send it to the patient's doctor.
///
/// Returns `None` when the patient has no doctor; nothing is stored.
pub fn record_voice_message(state: &CoreState) -> Result<Option<VoiceMessage>, PatientError> {
    let patient = state.require_role(Role::Patient)?;
    let platform = state.platform();
    platform.say(RECORDING_STARTED);

    let transcript = match platform.recognizer.listen_once() {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "Voice message recognition failed");
            platform.say(RECORDING_FAILED);
            return Err(e.into());
        }
    };

    let conn = state.open_db()?;
    let Some(doctor_id) = repository::get_doctor_for_patient(&conn, &patient.id)? else {
        platform.say(NO_DOCTOR);
        return Ok(None);
    };

    let message = repository::insert_voice_message(
        &conn,
        &NewVoiceMessage {
            patient_id: patient.id,
            doctor_id,
            audio_url: None,
            transcription: Some(transcript),
            message_date: platform.clock.today_utc(),
            listened: false,
        },
    )?;
    tracing::info!(message_id = %message.id, %doctor_id, "Voice message sent");
    platform.say(RECORDING_SENT);
    Ok(Some(message))
}
