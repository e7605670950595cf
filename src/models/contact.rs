use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub contact_name: String,
    pub phone_number: String,
    pub relationship: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEmergencyContact {
    pub contact_name: String,
    pub phone_number: String,
    pub relationship: String,
}

impl NewEmergencyContact {
    /// A contact row is only kept when every field was filled in.
    pub fn is_complete(&self) -> bool {
        !self.contact_name.trim().is_empty()
            && !self.phone_number.trim().is_empty()
            && !self.relationship.trim().is_empty()
    }
}
