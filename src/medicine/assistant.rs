//! Medicine authoring and the spoken "next dose" announcement.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use super::frequency::{expand_times, normalize_time};
use super::next_dose::{format_remaining, next_dose, NextDose};
use super::MedicineError;
use crate::core_state::CoreState;
use crate::db::repository;
use crate::models::enums::{FoodTiming, Frequency, Role};
use crate::models::{DoseSchedule, NewDoseSchedule};

pub const SAVED_MESSAGE: &str = "Medicine schedule saved successfully.";
pub const LOADING_MESSAGE: &str = "Loading your medicine schedule.";
pub const NOTHING_SCHEDULED_MESSAGE: &str = "No medicines scheduled. Please contact your doctor.";
pub const NONE_LEFT_MESSAGE: &str = "No upcoming medicines for today.";

/// Frequency label stored on every authored schedule.
const DAILY_LABEL: &str = "Daily";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineForm {
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: Frequency,
    /// Slot times as entered, `HH:MM`. Resized to the frequency on save.
    #[serde(default)]
    pub times: Vec<String>,
    pub timing: FoodTiming,
}

impl Default for MedicineForm {
    fn default() -> Self {
        Self {
            medicine_name: String::new(),
            dosage: String::new(),
            frequency: Frequency::Once,
            times: vec!["09:00".into()],
            timing: FoodTiming::AfterFood,
        }
    }
}

/// Write one active schedule per slot time for the logged-in patient.
pub fn save_medicine(
    state: &CoreState,
    form: &MedicineForm,
) -> Result<Vec<DoseSchedule>, MedicineError> {
    let patient = state.require_role(Role::Patient)?;
    if form.medicine_name.trim().is_empty() {
        return Err(MedicineError::MissingField("medicine_name"));
    }
    if form.dosage.trim().is_empty() {
        return Err(MedicineError::MissingField("dosage"));
    }

    // Validate every slot before writing any of them
    let times = expand_times(form.frequency, &form.times)
        .iter()
        .map(|t| normalize_time(t))
        .collect::<Result<Vec<_>, _>>()?;

    let conn = state.open_db()?;
    let mut saved = Vec::with_capacity(times.len());
    for scheduled_time in times {
        saved.push(repository::insert_dose_schedule(
            &conn,
            &NewDoseSchedule {
                patient_id: patient.id,
                medicine_name: form.medicine_name.trim().to_string(),
                dosage: form.dosage.trim().to_string(),
                scheduled_time,
                frequency: DAILY_LABEL.into(),
                instructions: Some(form.timing.instruction().to_string()),
                active: true,
            },
        )?);
    }
    tracing::info!(
        medicine = %form.medicine_name,
        frequency = %form.frequency,
        slots = saved.len(),
        "Medicine schedule saved"
    );

    state.platform().say(SAVED_MESSAGE);
    Ok(saved)
}

/// Spoken form of an upcoming dose.
pub fn upcoming_message(hour: u32, minute: u32, schedule: &DoseSchedule, remaining: u32) -> String {
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let at: String = schedule.scheduled_time.chars().take(5).collect();
    format!(
        "Current time is {hour} {minute} {meridiem}. You need to take {}, {}, at {at}. You have {} remaining.",
        schedule.medicine_name,
        schedule.dosage,
        format_remaining(remaining),
    )
}

/// Look up and speak the patient's next dose for today.
pub fn announce_next_dose(state: &CoreState) -> Result<NextDose, MedicineError> {
    let patient = state.require_role(Role::Patient)?;
    let platform = state.platform();
    platform.say(LOADING_MESSAGE);

    let conn = state.open_db()?;
    let schedules = repository::get_active_schedules_for_patient(&conn, &patient.id)?;
    let now = platform.clock.now().time();
    let next = next_dose(now, &schedules);

    match &next {
        NextDose::NothingScheduled => platform.say(NOTHING_SCHEDULED_MESSAGE),
        NextDose::NoneLeftToday => platform.say(NONE_LEFT_MESSAGE),
        NextDose::Upcoming {
            schedule,
            remaining_minutes,
        } => {
            tracing::debug!(
                medicine = %schedule.medicine_name,
                remaining_minutes,
                "Next dose found"
            );
            platform.say(&upcoming_message(
                now.hour(),
                now.minute(),
                schedule,
                *remaining_minutes,
            ));
        }
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_state::test_support::*;
    use crate::platform::testing::*;

    fn form(name: &str, frequency: Frequency, times: &[&str]) -> MedicineForm {
        MedicineForm {
            medicine_name: name.into(),
            dosage: "500mg".into(),
            frequency,
            times: times.iter().map(|t| t.to_string()).collect(),
            timing: FoodTiming::BeforeFood,
        }
    }

    fn platform_at(time: &str) -> (crate::platform::Platform, std::sync::Arc<RecordingSpeech>) {
        fake_platform(
            ScriptedRecognizer::default(),
            None,
            FixedClock::at("2026-03-01", time),
        )
    }

    #[test]
    fn save_writes_one_schedule_per_slot() {
        let (platform, speech) = platform_at("08:00:00");
        let (state, _dir) = temp_state(platform);
        let patient = login_as(&state, Role::Patient, "Asha Rao");

        let saved = save_medicine(&state, &form("Metformin", Frequency::Twice, &["08:30"])).unwrap();

        let times: Vec<&str> = saved.iter().map(|s| s.scheduled_time.as_str()).collect();
        assert_eq!(times, vec!["08:30:00", "21:00:00"]);
        assert!(saved.iter().all(|s| s.frequency == "Daily"
            && s.instructions.as_deref() == Some("Before Food")
            && s.active
            && s.patient_id == patient.id));
        assert_eq!(speech.last().unwrap(), SAVED_MESSAGE);
    }

    #[test]
    fn save_rejects_blank_fields_and_bad_times() {
        let (platform, _) = platform_at("08:00:00");
        let (state, _dir) = temp_state(platform);
        let patient = login_as(&state, Role::Patient, "Asha Rao");

        assert!(matches!(
            save_medicine(&state, &form("  ", Frequency::Once, &[])),
            Err(MedicineError::MissingField("medicine_name"))
        ));
        assert!(matches!(
            save_medicine(&state, &form("Aspirin", Frequency::Twice, &["08:00", "99:99"])),
            Err(MedicineError::InvalidTime(_))
        ));
        let conn = state.open_db().unwrap();
        assert!(repository::get_active_schedules_for_patient(&conn, &patient.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn announce_with_nothing_scheduled() {
        let (platform, speech) = platform_at("08:00:00");
        let (state, _dir) = temp_state(platform);
        login_as(&state, Role::Patient, "Asha Rao");

        assert_eq!(announce_next_dose(&state).unwrap(), NextDose::NothingScheduled);
        assert_eq!(
            speech.spoken(),
            vec![LOADING_MESSAGE.to_string(), NOTHING_SCHEDULED_MESSAGE.to_string()]
        );
    }

    #[test]
    fn announce_upcoming_dose_phrase() {
        let (platform, speech) = platform_at("13:05:20");
        let (state, _dir) = temp_state(platform);
        login_as(&state, Role::Patient, "Asha Rao");
        save_medicine(&state, &form("Metformin", Frequency::Thrice, &[])).unwrap();

        let next = announce_next_dose(&state).unwrap();
        assert!(matches!(next, NextDose::Upcoming { remaining_minutes: 55, .. }));
        assert_eq!(
            speech.last().unwrap(),
            "Current time is 13 5 PM. You need to take Metformin, 500mg, at 14:00. You have 55 minutes remaining."
        );
    }

    #[test]
    fn announce_after_last_dose() {
        let (platform, speech) = platform_at("21:30:00");
        let (state, _dir) = temp_state(platform);
        login_as(&state, Role::Patient, "Asha Rao");
        save_medicine(&state, &form("Metformin", Frequency::Twice, &[])).unwrap();

        assert_eq!(announce_next_dose(&state).unwrap(), NextDose::NoneLeftToday);
        assert_eq!(speech.last().unwrap(), NONE_LEFT_MESSAGE);
    }

    #[test]
    fn upcoming_message_morning_with_hours() {
        let (platform, _) = platform_at("07:59:00");
        let (state, _dir) = temp_state(platform);
        login_as(&state, Role::Patient, "Asha Rao");
        let saved = save_medicine(&state, &form("Aspirin", Frequency::Once, &["09:00"])).unwrap();

        assert_eq!(
            upcoming_message(7, 59, &saved[0], 61),
            "Current time is 7 59 AM. You need to take Aspirin, 500mg, at 09:00. You have 1 hour and 1 minutes remaining."
        );
    }
}
