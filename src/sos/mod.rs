//! SOS button handling: press classification, the timer runtime that
//! drives it, and the alert service that acts on each resolution.

pub mod button;
pub mod disambiguator;
pub mod emergency;
pub mod session;

pub use button::{ButtonError, SosButton};
pub use disambiguator::{PressDisambiguator, Resolution, DEFAULT_WINDOW_MS};
pub use emergency::{dispatch_resolutions, EmergencyError, EmergencyService};
pub use session::SosSession;
