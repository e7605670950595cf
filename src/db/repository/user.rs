use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::store::{append_record, list_records, Collection, RecordStore};
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::*;

#[derive(Serialize)]
struct UserRecord<'a> {
    #[serde(flatten)]
    user: &'a NewUser,
    updated_at: DateTime<Utc>,
}

pub fn insert_user(store: &dyn RecordStore, user: &NewUser) -> Result<User, DatabaseError> {
    append_record(
        store,
        Collection::Users,
        &UserRecord {
            user,
            updated_at: Utc::now(),
        },
    )
}

pub fn get_all_users(store: &dyn RecordStore) -> Result<Vec<User>, DatabaseError> {
    list_records(store, Collection::Users)
}

pub fn get_user(store: &dyn RecordStore, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    Ok(get_all_users(store)?.into_iter().find(|u| u.id == *id))
}

/// Case-insensitive lookup on the spoken login name.
pub fn get_user_by_voice_name(
    store: &dyn RecordStore,
    voice_name: &str,
) -> Result<Option<User>, DatabaseError> {
    let wanted = voice_name.to_lowercase();
    Ok(get_all_users(store)?
        .into_iter()
        .find(|u| u.voice_login_name.to_lowercase() == wanted))
}

pub fn get_doctors(store: &dyn RecordStore) -> Result<Vec<User>, DatabaseError> {
    Ok(get_all_users(store)?
        .into_iter()
        .filter(|u| u.role == Role::Doctor)
        .collect())
}
