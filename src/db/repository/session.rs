use uuid::Uuid;

use crate::db::store::{get_typed_value, set_typed_value, RecordStore};
use crate::db::DatabaseError;
use crate::models::*;

pub const CURRENT_USER_KEY: &str = "current_user";

fn health_card_key(user_id: &Uuid) -> String {
    format!("health_card:{user_id}")
}

pub fn set_current_user(store: &dyn RecordStore, user: &User) -> Result<(), DatabaseError> {
    set_typed_value(store, CURRENT_USER_KEY, user)
}

pub fn get_current_user(store: &dyn RecordStore) -> Result<Option<User>, DatabaseError> {
    get_typed_value(store, CURRENT_USER_KEY)
}

pub fn clear_current_user(store: &dyn RecordStore) -> Result<(), DatabaseError> {
    store.remove_value(CURRENT_USER_KEY)
}

pub fn save_health_card(
    store: &dyn RecordStore,
    user_id: &Uuid,
    card: &HealthCard,
) -> Result<(), DatabaseError> {
    set_typed_value(store, &health_card_key(user_id), card)
}

pub fn get_health_card(
    store: &dyn RecordStore,
    user_id: &Uuid,
) -> Result<Option<HealthCard>, DatabaseError> {
    get_typed_value(store, &health_card_key(user_id))
}
