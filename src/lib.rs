pub mod config;
pub mod logging;
pub mod platform; // Host speech, location, camera collaborators
pub mod models;
pub mod db;
pub mod core_state; // Shared state: data dir, session, platform
pub mod sos; // SOS press disambiguation + alerts
pub mod medicine; // Schedules and next-dose assistant
pub mod accounts; // Account creation, voice login
pub mod patient; // Patient dashboard actions
pub mod doctor; // Doctor dashboard
pub mod vision; // Object-detection announcements

pub use core_state::{CoreError, CoreState};
pub use platform::Platform;
