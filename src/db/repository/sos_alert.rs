use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::db::store::{append_record, list_records, Collection, RecordStore};
use crate::db::DatabaseError;
use crate::models::enums::AlertStatus;
use crate::models::*;

pub fn insert_sos_alert(
    store: &dyn RecordStore,
    alert: &NewSosAlert,
) -> Result<SosAlert, DatabaseError> {
    append_record(store, Collection::SosAlerts, alert)
}

pub fn get_sos_alerts_for_patient(
    store: &dyn RecordStore,
    patient_id: &Uuid,
) -> Result<Vec<SosAlert>, DatabaseError> {
    let alerts: Vec<SosAlert> = list_records(store, Collection::SosAlerts)?;
    Ok(alerts
        .into_iter()
        .filter(|a| a.patient_id == *patient_id)
        .collect())
}

pub fn get_sos_alert(store: &dyn RecordStore, id: &Uuid) -> Result<Option<SosAlert>, DatabaseError> {
    let alerts: Vec<SosAlert> = list_records(store, Collection::SosAlerts)?;
    Ok(alerts.into_iter().find(|a| a.id == *id))
}

/// Mark an alert cancelled by the patient.
pub fn cancel_sos_alert(
    store: &dyn RecordStore,
    id: &Uuid,
    cancelled_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    store.update(
        Collection::SosAlerts,
        &id.to_string(),
        json!({
            "status": AlertStatus::Cancelled.as_str(),
            "cancelled_at": cancelled_at,
        }),
    )
}
