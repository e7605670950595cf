//! Repository layer: entity-scoped operations over the record store.
//!
//! Each sub-module owns one collection. All public functions are
//! re-exported here.

mod contact;
mod medicine;
mod relationship;
mod session;
mod sos_alert;
mod user;
mod voice_message;

pub use contact::*;
pub use medicine::*;
pub use relationship::*;
pub use session::*;
pub use sos_alert::*;
pub use user::*;
pub use voice_message::*;
