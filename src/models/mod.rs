pub mod enums;
mod contact;
mod health_card;
mod medicine;
mod relationship;
mod sos_alert;
mod user;
mod voice_message;

pub use contact::*;
pub use health_card::*;
pub use medicine::*;
pub use relationship::*;
pub use sos_alert::*;
pub use user::*;
pub use voice_message::*;
