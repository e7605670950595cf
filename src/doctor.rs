//! Doctor dashboard: per-patient overview and voice message playback.

use std::cmp::Reverse;

use serde::Serialize;
use uuid::Uuid;

use crate::core_state::{CoreError, CoreState};
use crate::db::{repository, DatabaseError};
use crate::models::enums::{AlertStatus, Role};
use crate::models::{DoseSchedule, SosAlert, User, VoiceMessage};

pub const WELCOME_MESSAGE: &str = "Welcome to doctor dashboard. Viewing all your patients.";

/// How many messages and alerts each patient card shows.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Voice message not found: {0}")]
    MessageNotFound(Uuid),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientOverview {
    pub patient: User,
    /// Newest first, at most [`RECENT_LIMIT`].
    pub voice_messages: Vec<VoiceMessage>,
    /// Newest first, at most [`RECENT_LIMIT`].
    pub sos_alerts: Vec<SosAlert>,
    pub medicines: Vec<DoseSchedule>,
}

impl PatientOverview {
    pub fn new_message_count(&self) -> usize {
        self.voice_messages.iter().filter(|m| !m.listened).count()
    }

    pub fn active_alert_count(&self) -> usize {
        self.sos_alerts
            .iter()
            .filter(|a| a.status == AlertStatus::Active)
            .count()
    }
}

pub fn welcome(state: &CoreState) {
    state.platform().say(WELCOME_MESSAGE);
}

/// One overview per linked patient. Links to unknown users are skipped.
pub fn load_dashboard(state: &CoreState) -> Result<Vec<PatientOverview>, DoctorError> {
    let doctor = state.require_role(Role::Doctor)?;
    let conn = state.open_db()?;

    let patient_ids = repository::get_patients_for_doctor(&conn, &doctor.id)?;
    let messages = repository::get_voice_messages_for_doctor(&conn, &doctor.id)?;

    let mut overviews = Vec::with_capacity(patient_ids.len());
    for patient_id in patient_ids {
        let Some(patient) = repository::get_user(&conn, &patient_id)? else {
            tracing::warn!(%patient_id, "Linked patient no longer exists");
            continue;
        };

        let mut voice_messages: Vec<VoiceMessage> = messages
            .iter()
            .filter(|m| m.patient_id == patient_id)
            .cloned()
            .collect();
        voice_messages.sort_by_key(|m| Reverse(m.created_at));
        voice_messages.truncate(RECENT_LIMIT);

        let mut sos_alerts = repository::get_sos_alerts_for_patient(&conn, &patient_id)?;
        sos_alerts.sort_by_key(|a| Reverse(a.created_at));
        sos_alerts.truncate(RECENT_LIMIT);

        let medicines = repository::get_active_schedules_for_patient(&conn, &patient_id)?;

        overviews.push(PatientOverview {
            patient,
            voice_messages,
            sos_alerts,
            medicines,
        });
    }
    tracing::debug!(patients = overviews.len(), "Doctor dashboard loaded");
    Ok(overviews)
}

/// Speak a message's transcription and mark it listened. Messages with
/// no transcription are left untouched; returns whether it was played.
pub fn play_voice_message(state: &CoreState, message_id: &Uuid) -> Result<bool, DoctorError> {
    let doctor = state.require_role(Role::Doctor)?;
    let conn = state.open_db()?;

    let message = repository::get_voice_messages_for_doctor(&conn, &doctor.id)?
        .into_iter()
        .find(|m| m.id == *message_id)
        .ok_or(DoctorError::MessageNotFound(*message_id))?;

    let Some(text) = message.transcription.as_deref() else {
        return Ok(false);
    };
    state.platform().say(&format!("Patient says: {text}"));
    repository::mark_voice_message_listened(&conn, &message.id)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::test_support::*;
    use crate::models::enums::AlertType;
    use crate::models::{NewRelationship, NewSosAlert, NewVoiceMessage};
    use chrono::NaiveDate;

    fn link(state: &CoreState, doctor: &User, patient_id: Uuid) {
        let conn = state.open_db().unwrap();
        repository::insert_relationship(
            &conn,
            &NewRelationship {
                doctor_id: doctor.id,
                patient_id,
            },
        )
        .unwrap();
    }

    fn message(state: &CoreState, doctor: &User, patient: &User, text: Option<&str>) -> VoiceMessage {
        let conn = state.open_db().unwrap();
        repository::insert_voice_message(
            &conn,
            &NewVoiceMessage {
                patient_id: patient.id,
                doctor_id: doctor.id,
                audio_url: None,
                transcription: text.map(str::to_string),
                message_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                listened: false,
            },
        )
        .unwrap()
    }

    #[test]
    fn dashboard_limits_to_five_newest() {
        let (platform, _) = quiet_platform();
        let (state, _dir) = temp_state(platform);
        let patient = add_user(&state, Role::Patient, "Asha Rao");
        let doctor = login_as(&state, Role::Doctor, "Dr Mehta");
        link(&state, &doctor, patient.id);

        for i in 0..7 {
            message(&state, &doctor, &patient, Some(&format!("update {i}")));
            let conn = state.open_db().unwrap();
            repository::insert_sos_alert(
                &conn,
                &NewSosAlert {
                    patient_id: patient.id,
                    alert_type: AlertType::Single,
                    latitude: None,
                    longitude: None,
                    status: AlertStatus::Active,
                },
            )
            .unwrap();
        }

        let dashboard = load_dashboard(&state).unwrap();
        assert_eq!(dashboard.len(), 1);
        let card = &dashboard[0];
        assert_eq!(card.patient.id, patient.id);
        assert_eq!(card.voice_messages.len(), RECENT_LIMIT);
        assert_eq!(card.sos_alerts.len(), RECENT_LIMIT);
        assert_eq!(
            card.voice_messages[0].transcription.as_deref(),
            Some("update 6")
        );
        assert!(card
            .voice_messages
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(card.new_message_count(), 5);
        assert_eq!(card.active_alert_count(), 5);
    }

    #[test]
    fn dashboard_skips_unknown_patients_and_other_doctors() {
        let (platform, _) = quiet_platform();
        let (state, _dir) = temp_state(platform);
        let patient = add_user(&state, Role::Patient, "Asha Rao");
        let other_doctor = add_user(&state, Role::Doctor, "Dr Other");
        let doctor = login_as(&state, Role::Doctor, "Dr Mehta");
        link(&state, &doctor, patient.id);
        link(&state, &doctor, Uuid::new_v4());
        message(&state, &other_doctor, &patient, Some("not for you"));

        let dashboard = load_dashboard(&state).unwrap();
        assert_eq!(dashboard.len(), 1);
        assert!(dashboard[0].voice_messages.is_empty());
    }

    #[test]
    fn play_marks_listened() {
        let (platform, speech) = quiet_platform();
        let (state, _dir) = temp_state(platform);
        let patient = add_user(&state, Role::Patient, "Asha Rao");
        let doctor = login_as(&state, Role::Doctor, "Dr Mehta");
        link(&state, &doctor, patient.id);
        let msg = message(&state, &doctor, &patient, Some("My knee hurts"));

        assert!(play_voice_message(&state, &msg.id).unwrap());
        assert_eq!(speech.last().unwrap(), "Patient says: My knee hurts");

        let dashboard = load_dashboard(&state).unwrap();
        assert!(dashboard[0].voice_messages[0].listened);
        assert_eq!(dashboard[0].new_message_count(), 0);
    }

    #[test]
    fn play_without_transcription_does_nothing() {
        let (platform, speech) = quiet_platform();
        let (state, _dir) = temp_state(platform);
        let patient = add_user(&state, Role::Patient, "Asha Rao");
        let doctor = login_as(&state, Role::Doctor, "Dr Mehta");
        let msg = message(&state, &doctor, &patient, None);

        assert!(!play_voice_message(&state, &msg.id).unwrap());
        assert!(speech.spoken().is_empty());
        assert!(matches!(
            play_voice_message(&state, &Uuid::new_v4()),
            Err(DoctorError::MessageNotFound(_))
        ));
    }
}
