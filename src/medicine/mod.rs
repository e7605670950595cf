//! Medicine scheduling: slot expansion, next-dose lookup and the spoken
//! assistant built on them.

pub mod assistant;
pub mod frequency;
pub mod next_dose;

pub use assistant::{announce_next_dose, save_medicine, MedicineForm};
pub use frequency::{expand_times, normalize_time};
pub use next_dose::{format_remaining, next_dose, time_key, NextDose};

use thiserror::Error;

use crate::core_state::CoreError;
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum MedicineError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
