use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One daily reminder slot for a medicine.
///
/// `scheduled_time` is always `HH:MM:SS`, 24-hour, zero padded. Ordering
/// and "is later than" checks compare the strings directly, which is only
/// sound because of that fixed width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseSchedule {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub medicine_name: String,
    pub dosage: String,
    pub scheduled_time: String,
    /// Display label only.
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDoseSchedule {
    pub patient_id: Uuid,
    pub medicine_name: String,
    pub dosage: String,
    pub scheduled_time: String,
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub active: bool,
}
