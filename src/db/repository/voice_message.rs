use serde_json::json;
use uuid::Uuid;

use crate::db::store::{append_record, list_records, Collection, RecordStore};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_voice_message(
    store: &dyn RecordStore,
    message: &NewVoiceMessage,
) -> Result<VoiceMessage, DatabaseError> {
    append_record(store, Collection::VoiceMessages, message)
}

pub fn get_voice_messages_for_doctor(
    store: &dyn RecordStore,
    doctor_id: &Uuid,
) -> Result<Vec<VoiceMessage>, DatabaseError> {
    let messages: Vec<VoiceMessage> = list_records(store, Collection::VoiceMessages)?;
    Ok(messages
        .into_iter()
        .filter(|m| m.doctor_id == *doctor_id)
        .collect())
}

pub fn mark_voice_message_listened(store: &dyn RecordStore, id: &Uuid) -> Result<(), DatabaseError> {
    store.update(
        Collection::VoiceMessages,
        &id.to_string(),
        json!({ "listened": true }),
    )
}
