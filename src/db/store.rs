//! Collection-oriented record store.
//!
//! Records are JSON objects grouped by collection. The store assigns `id`
//! and `created_at` on append and merges partial updates field by field.
//! Single keyed values (session, health cards) live beside the
//! collections. `rusqlite::Connection` is the bundled implementation;
//! an embedding front-end can supply its own.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    EmergencyContacts,
    MedicineSchedules,
    VoiceMessages,
    SosAlerts,
    DoctorPatientRelationships,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::EmergencyContacts => "emergency_contacts",
            Self::MedicineSchedules => "medicine_schedules",
            Self::VoiceMessages => "voice_messages",
            Self::SosAlerts => "sos_alerts",
            Self::DoctorPatientRelationships => "doctor_patient_relationships",
        }
    }
}

/// Fields owned by the store; partial updates never overwrite them.
const RESERVED_FIELDS: &[&str] = &["id", "created_at"];

pub trait RecordStore {
    /// All records of a collection in insertion order.
    fn list(&self, collection: Collection) -> Result<Vec<Value>, DatabaseError>;

    /// Store a new record; returns it with the generated `id` and `created_at`.
    fn append(&self, collection: Collection, record: Value) -> Result<Value, DatabaseError>;

    /// Merge `partial` into the record with `id`.
    fn update(&self, collection: Collection, id: &str, partial: Value) -> Result<(), DatabaseError>;

    fn get_value(&self, key: &str) -> Result<Option<Value>, DatabaseError>;

    fn set_value(&self, key: &str, value: &Value) -> Result<(), DatabaseError>;

    fn remove_value(&self, key: &str) -> Result<(), DatabaseError>;
}

fn into_object(collection: Collection, value: Value) -> Result<Map<String, Value>, DatabaseError> {
    match value {
        Value::Object(fields) => Ok(fields),
        other => Err(DatabaseError::ConstraintViolation(format!(
            "{} records must be JSON objects, got {other}",
            collection.as_str()
        ))),
    }
}

impl RecordStore for Connection {
    fn list(&self, collection: Collection) -> Result<Vec<Value>, DatabaseError> {
        let mut stmt =
            self.prepare("SELECT body FROM records WHERE collection = ?1 ORDER BY seq")?;
        let rows = stmt.query_map(params![collection.as_str()], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }
        Ok(records)
    }

    fn append(&self, collection: Collection, record: Value) -> Result<Value, DatabaseError> {
        let mut fields = into_object(collection, record)?;
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        fields.insert("id".into(), Value::String(id.clone()));
        fields.insert("created_at".into(), Value::String(created_at.clone()));
        let body = Value::Object(fields);

        self.execute(
            "INSERT INTO records (collection, id, created_at, body) VALUES (?1, ?2, ?3, ?4)",
            params![
                collection.as_str(),
                id,
                created_at,
                serde_json::to_string(&body)?,
            ],
        )?;
        tracing::debug!(collection = collection.as_str(), %id, "Record appended");
        Ok(body)
    }

    fn update(&self, collection: Collection, id: &str, partial: Value) -> Result<(), DatabaseError> {
        let changes = into_object(collection, partial)?;

        let body: Option<String> = self
            .query_row(
                "SELECT body FROM records WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;
        let body = body.ok_or_else(|| DatabaseError::NotFound {
            entity_type: collection.as_str().into(),
            id: id.into(),
        })?;

        let mut current = into_object(collection, serde_json::from_str(&body)?)?;
        for (key, value) in changes {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            current.insert(key, value);
        }

        self.execute(
            "UPDATE records SET body = ?1 WHERE collection = ?2 AND id = ?3",
            params![
                serde_json::to_string(&Value::Object(current))?,
                collection.as_str(),
                id,
            ],
        )?;
        tracing::debug!(collection = collection.as_str(), %id, "Record updated");
        Ok(())
    }

    fn get_value(&self, key: &str) -> Result<Option<Value>, DatabaseError> {
        let raw: Option<String> = self
            .query_row("SELECT value FROM kv_values WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_value(&self, key: &str, value: &Value) -> Result<(), DatabaseError> {
        self.execute(
            "INSERT INTO kv_values (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, serde_json::to_string(value)?],
        )?;
        Ok(())
    }

    fn remove_value(&self, key: &str) -> Result<(), DatabaseError> {
        self.execute("DELETE FROM kv_values WHERE key = ?1", [key])?;
        Ok(())
    }
}

// ═══════════════════════════════════════════
// Typed helpers
// ═══════════════════════════════════════════

/// Append a typed record and decode the stored result.
pub fn append_record<N, R>(
    store: &dyn RecordStore,
    collection: Collection,
    record: &N,
) -> Result<R, DatabaseError>
where
    N: Serialize,
    R: DeserializeOwned,
{
    let stored = store.append(collection, serde_json::to_value(record)?)?;
    Ok(serde_json::from_value(stored)?)
}

/// List and decode every record of a collection.
pub fn list_records<R: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
) -> Result<Vec<R>, DatabaseError> {
    store
        .list(collection)?
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(DatabaseError::from))
        .collect()
}

pub fn get_typed_value<R: DeserializeOwned>(
    store: &dyn RecordStore,
    key: &str,
) -> Result<Option<R>, DatabaseError> {
    match store.get_value(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub fn set_typed_value<T: Serialize>(
    store: &dyn RecordStore,
    key: &str,
    value: &T,
) -> Result<(), DatabaseError> {
    store.set_value(key, &serde_json::to_value(value)?)
}
