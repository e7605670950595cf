use uuid::Uuid;

use crate::db::store::{append_record, list_records, Collection, RecordStore};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_dose_schedule(
    store: &dyn RecordStore,
    schedule: &NewDoseSchedule,
) -> Result<DoseSchedule, DatabaseError> {
    append_record(store, Collection::MedicineSchedules, schedule)
}

/// Active schedules for one patient, in insertion order.
pub fn get_active_schedules_for_patient(
    store: &dyn RecordStore,
    patient_id: &Uuid,
) -> Result<Vec<DoseSchedule>, DatabaseError> {
    let schedules: Vec<DoseSchedule> = list_records(store, Collection::MedicineSchedules)?;
    Ok(schedules
        .into_iter()
        .filter(|s| s.patient_id == *patient_id && s.active)
        .collect())
}
