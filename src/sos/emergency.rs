//! Raising and cancelling SOS alerts for the logged-in patient.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc;

use super::button::ButtonError;
use super::disambiguator::Resolution;
use crate::core_state::{CoreError, CoreState};
use crate::db::{repository, DatabaseError};
use crate::models::enums::{AlertStatus, AlertType, Role};
use crate::models::{EmergencyContact, NewSosAlert, SosAlert};

pub const CANCELLED_MESSAGE: &str = "Emergency alert cancelled successfully.";
pub const NOTHING_TO_CANCEL_MESSAGE: &str = "No active emergency alert to cancel.";

#[derive(Error, Debug)]
pub enum EmergencyError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("SOS button error: {0}")]
    Button(#[from] ButtonError),
    #[error("Internal lock error")]
    LockPoisoned,
}

/// Spoken confirmation for a raised alert.
pub fn alert_message(alert_type: AlertType, contacts: &[EmergencyContact]) -> String {
    let audience = match alert_type {
        AlertType::Single => "contacts",
        AlertType::Double => "doctor and contacts",
    };
    let mut message = if contacts.is_empty() {
        format!("Emergency alert sent to your {audience}.")
    } else {
        let names: Vec<&str> = contacts.iter().map(|c| c.contact_name.as_str()).collect();
        format!("Emergency alert sent to your {audience}: {}.", names.join(", and "))
    };
    message.push_str(" Sharing your current location.");
    message
}

/// Records alerts for one patient session and remembers the last one
/// raised so it can be cancelled.
pub struct EmergencyService {
    state: Arc<CoreState>,
    active_alert: Mutex<Option<SosAlert>>,
}

impl EmergencyService {
    pub fn new(state: Arc<CoreState>) -> Self {
        Self {
            state,
            active_alert: Mutex::new(None),
        }
    }

    pub fn active_alert(&self) -> Result<Option<SosAlert>, EmergencyError> {
        let guard = self
            .active_alert
            .lock()
            .map_err(|_| EmergencyError::LockPoisoned)?;
        Ok(guard.clone())
    }

    /// Announce, locate and store an alert for a resolved press cycle.
    pub fn raise(&self, resolution: Resolution) -> Result<SosAlert, EmergencyError> {
        let patient = self.state.require_role(Role::Patient)?;
        let platform = self.state.platform();
        let conn = self.state.open_db()?;
        let alert_type = resolution.alert_type();

        let contacts = repository::get_emergency_contacts_for_patient(&conn, &patient.id)?;
        platform.say(&alert_message(alert_type, &contacts));

        let position = platform.location.current_position();
        if position.is_none() {
            tracing::warn!("No location fix, recording alert without coordinates");
        }

        let alert = repository::insert_sos_alert(
            &conn,
            &NewSosAlert {
                patient_id: patient.id,
                alert_type,
                latitude: position.map(|p| p.latitude),
                longitude: position.map(|p| p.longitude),
                status: AlertStatus::Active,
            },
        )?;
        tracing::info!(
            alert_id = %alert.id,
            alert_type = %alert_type,
            contacts = contacts.len(),
            "SOS alert raised"
        );

        let mut active = self
            .active_alert
            .lock()
            .map_err(|_| EmergencyError::LockPoisoned)?;
        *active = Some(alert.clone());
        Ok(alert)
    }

    /// Cancel the remembered alert. Returns it, or `None` when nothing
    /// was active; both cases are announced.
    pub fn cancel_active(&self) -> Result<Option<SosAlert>, EmergencyError> {
        let mut active = self
            .active_alert
            .lock()
            .map_err(|_| EmergencyError::LockPoisoned)?;

        let Some(alert) = active.take() else {
            self.state.platform().say(NOTHING_TO_CANCEL_MESSAGE);
            return Ok(None);
        };

        let conn = self.state.open_db()?;
        if let Err(e) = repository::cancel_sos_alert(&conn, &alert.id, Utc::now()) {
            *active = Some(alert);
            return Err(e.into());
        }
        drop(active);

        tracing::info!(alert_id = %alert.id, "SOS alert cancelled");
        self.state.platform().say(CANCELLED_MESSAGE);
        Ok(repository::get_sos_alert(&conn, &alert.id)?)
    }
}

/// Raise every resolution coming off an SOS button, in order.
/// Returns when the button is dropped.
pub async fn dispatch_resolutions(
    mut rx: mpsc::UnboundedReceiver<Resolution>,
    service: Arc<EmergencyService>,
) {
    while let Some(resolution) = rx.recv().await {
        let svc = Arc::clone(&service);
        match tokio::task::spawn_blocking(move || svc.raise(resolution)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!(error = %e, ?resolution, "Failed to raise SOS alert"),
            Err(e) => tracing::error!(error = %e, "SOS alert task panicked"),
        }
    }
    tracing::debug!("SOS dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::test_support::*;
    use crate::models::NewEmergencyContact;
    use crate::platform::testing::*;
    use crate::platform::Coordinates;

    fn contact(name: &str) -> NewEmergencyContact {
        NewEmergencyContact {
            contact_name: name.into(),
            phone_number: "555-0100".into(),
            relationship: "family".into(),
        }
    }

    fn located_platform() -> (crate::platform::Platform, Arc<RecordingSpeech>) {
        fake_platform(
            ScriptedRecognizer::default(),
            Some(Coordinates {
                latitude: 12.97,
                longitude: 77.59,
            }),
            FixedClock::at("2026-03-01", "08:00:00"),
        )
    }

    #[test]
    fn message_without_contacts() {
        assert_eq!(
            alert_message(AlertType::Single, &[]),
            "Emergency alert sent to your contacts. Sharing your current location."
        );
        assert_eq!(
            alert_message(AlertType::Double, &[]),
            "Emergency alert sent to your doctor and contacts. Sharing your current location."
        );
    }

    #[test]
    fn raise_single_names_contacts_and_records_location() {
        let (platform, speech) = located_platform();
        let (state, _dir) = temp_state(platform);
        let patient = login_as(&state, Role::Patient, "Asha Rao");
        {
            let conn = state.open_db().unwrap();
            repository::insert_emergency_contact(&conn, &patient.id, &contact("Ravi")).unwrap();
            repository::insert_emergency_contact(&conn, &patient.id, &contact("Meena")).unwrap();
        }

        let service = EmergencyService::new(state.clone());
        let alert = service.raise(Resolution::SingleAlert).unwrap();

        assert_eq!(
            speech.last().unwrap(),
            "Emergency alert sent to your contacts: Ravi, and Meena. Sharing your current location."
        );
        assert_eq!(alert.alert_type, AlertType::Single);
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.latitude, Some(12.97));
        assert_eq!(alert.patient_id, patient.id);
        assert_eq!(service.active_alert().unwrap().unwrap().id, alert.id);
    }

    #[test]
    fn raise_without_location_still_records() {
        let (platform, speech) = quiet_platform();
        let (state, _dir) = temp_state(platform);
        login_as(&state, Role::Patient, "Asha Rao");

        let service = EmergencyService::new(state.clone());
        let alert = service.raise(Resolution::DoubleAlert).unwrap();

        assert_eq!(alert.alert_type, AlertType::Double);
        assert!(alert.latitude.is_none() && alert.longitude.is_none());
        assert!(speech.last().unwrap().starts_with("Emergency alert sent to your doctor and contacts."));
    }

    #[test]
    fn raise_survives_speech_failure() {
        let speech = Arc::new(RecordingSpeech::failing());
        let platform = crate::platform::Platform::new(
            speech.clone(),
            Arc::new(ScriptedRecognizer::default()),
            Arc::new(FixedLocation(None)),
        );
        let (state, _dir) = temp_state(platform);
        login_as(&state, Role::Patient, "Asha Rao");

        let service = EmergencyService::new(state);
        assert!(service.raise(Resolution::SingleAlert).is_ok());
    }

    #[test]
    fn raise_requires_patient_session() {
        let (platform, _) = quiet_platform();
        let (state, _dir) = temp_state(platform);
        let service = EmergencyService::new(state.clone());
        assert!(matches!(
            service.raise(Resolution::SingleAlert),
            Err(EmergencyError::Core(CoreError::NoActiveSession))
        ));

        login_as(&state, Role::Doctor, "Dr Mehta");
        assert!(matches!(
            service.raise(Resolution::SingleAlert),
            Err(EmergencyError::Core(CoreError::WrongRole { .. }))
        ));
    }

    #[test]
    fn cancel_marks_alert_and_is_idempotent() {
        let (platform, speech) = quiet_platform();
        let (state, _dir) = temp_state(platform);
        login_as(&state, Role::Patient, "Asha Rao");
        let service = EmergencyService::new(state.clone());

        let raised = service.raise(Resolution::SingleAlert).unwrap();
        let cancelled = service.cancel_active().unwrap().unwrap();
        assert_eq!(cancelled.id, raised.id);
        assert_eq!(cancelled.status, AlertStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(speech.last().unwrap(), CANCELLED_MESSAGE);

        assert!(service.cancel_active().unwrap().is_none());
        assert_eq!(speech.last().unwrap(), NOTHING_TO_CANCEL_MESSAGE);
        assert!(service.active_alert().unwrap().is_none());
    }

    #[test]
    fn cancel_with_nothing_raised() {
        let (platform, speech) = quiet_platform();
        let (state, _dir) = temp_state(platform);
        let service = EmergencyService::new(state);
        assert!(service.cancel_active().unwrap().is_none());
        assert_eq!(speech.spoken(), vec![NOTHING_TO_CANCEL_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn dispatcher_raises_each_resolution_in_order() {
        let (platform, _) = quiet_platform();
        let (state, _dir) = temp_state(platform);
        let patient = login_as(&state, Role::Patient, "Asha Rao");
        let service = Arc::new(EmergencyService::new(state.clone()));

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Resolution::SingleAlert).unwrap();
        tx.send(Resolution::DoubleAlert).unwrap();
        drop(tx);
        dispatch_resolutions(rx, service.clone()).await;

        let conn = state.open_db().unwrap();
        let alerts = repository::get_sos_alerts_for_patient(&conn, &patient.id).unwrap();
        let types: Vec<AlertType> = alerts.iter().map(|a| a.alert_type).collect();
        assert_eq!(types, vec![AlertType::Single, AlertType::Double]);
        assert_eq!(
            service.active_alert().unwrap().unwrap().alert_type,
            AlertType::Double
        );
    }
}
