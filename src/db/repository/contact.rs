use serde::Serialize;
use uuid::Uuid;

use crate::db::store::{append_record, list_records, Collection, RecordStore};
use crate::db::DatabaseError;
use crate::models::*;

#[derive(Serialize)]
struct ContactRecord<'a> {
    patient_id: Uuid,
    #[serde(flatten)]
    contact: &'a NewEmergencyContact,
}

pub fn insert_emergency_contact(
    store: &dyn RecordStore,
    patient_id: &Uuid,
    contact: &NewEmergencyContact,
) -> Result<EmergencyContact, DatabaseError> {
    append_record(
        store,
        Collection::EmergencyContacts,
        &ContactRecord {
            patient_id: *patient_id,
            contact,
        },
    )
}

pub fn get_emergency_contacts_for_patient(
    store: &dyn RecordStore,
    patient_id: &Uuid,
) -> Result<Vec<EmergencyContact>, DatabaseError> {
    let contacts: Vec<EmergencyContact> = list_records(store, Collection::EmergencyContacts)?;
    Ok(contacts
        .into_iter()
        .filter(|c| c.patient_id == *patient_id)
        .collect())
}
