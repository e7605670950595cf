use serde::{Deserialize, Serialize};

/// Patient-maintained health summary. Every field is free text as typed
/// (or dictated) by the patient or a helper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthCard {
    pub full_name: String,
    pub age: String,
    pub gender: String,
    pub blood_group: String,
    pub height: String,
    pub weight: String,
    pub known_diseases: String,
    pub allergies: String,
    pub current_symptoms: String,
    pub current_medications: String,
    pub past_medical_history: String,
    pub diagnosis_summary: String,
    pub special_instructions: String,
}
