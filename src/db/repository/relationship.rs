use uuid::Uuid;

use crate::db::store::{append_record, list_records, Collection, RecordStore};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_relationship(
    store: &dyn RecordStore,
    relationship: &NewRelationship,
) -> Result<DoctorPatientRelationship, DatabaseError> {
    append_record(store, Collection::DoctorPatientRelationships, relationship)
}

/// The first doctor linked to a patient, if any.
pub fn get_doctor_for_patient(
    store: &dyn RecordStore,
    patient_id: &Uuid,
) -> Result<Option<Uuid>, DatabaseError> {
    let links: Vec<DoctorPatientRelationship> =
        list_records(store, Collection::DoctorPatientRelationships)?;
    Ok(links
        .into_iter()
        .find(|r| r.patient_id == *patient_id)
        .map(|r| r.doctor_id))
}

pub fn get_patients_for_doctor(
    store: &dyn RecordStore,
    doctor_id: &Uuid,
) -> Result<Vec<Uuid>, DatabaseError> {
    let links: Vec<DoctorPatientRelationship> =
        list_records(store, Collection::DoctorPatientRelationships)?;
    Ok(links
        .into_iter()
        .filter(|r| r.doctor_id == *doctor_id)
        .map(|r| r.patient_id)
        .collect())
}
