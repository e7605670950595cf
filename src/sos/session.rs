//! One patient's SOS wiring: a button sized from config feeding the
//! alert dispatcher.
//!
//! The host starts a session when the patient dashboard opens and ends
//! (or drops) it on logout. Dropping the session drops the button, which
//! cancels any pending single and closes the channel so the dispatcher
//! stops after raising whatever was already resolved.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::button::SosButton;
use super::emergency::{dispatch_resolutions, EmergencyError, EmergencyService};
use crate::core_state::CoreState;
use crate::models::enums::Role;
use crate::models::SosAlert;

pub struct SosSession {
    button: SosButton,
    service: Arc<EmergencyService>,
    dispatcher: JoinHandle<()>,
}

impl SosSession {
    /// Requires a logged-in patient and a tokio runtime.
    pub fn start(state: Arc<CoreState>) -> Result<Self, EmergencyError> {
        let patient = state.require_role(Role::Patient)?;
        let (button, rx) = SosButton::from_config(&state.config)?;
        let service = Arc::new(EmergencyService::new(state));
        let dispatcher = tokio::spawn(dispatch_resolutions(rx, Arc::clone(&service)));

        tracing::info!(patient_id = %patient.id, "SOS session started");
        Ok(Self {
            button,
            service,
            dispatcher,
        })
    }

    pub fn press(&self) -> Result<(), EmergencyError> {
        Ok(self.button.press()?)
    }

    /// Drop a pending single press. Returns whether one was pending.
    pub fn cancel_pending(&self) -> Result<bool, EmergencyError> {
        Ok(self.button.cancel()?)
    }

    /// Blocks on the database; call from a blocking context.
    pub fn cancel_alert(&self) -> Result<Option<SosAlert>, EmergencyError> {
        self.service.cancel_active()
    }

    pub fn service(&self) -> &Arc<EmergencyService> {
        &self.service
    }

    /// Tear down the button and wait for in-flight alerts to be stored.
    pub async fn end(self) {
        let Self {
            button, dispatcher, ..
        } = self;
        drop(button);
        if let Err(e) = dispatcher.await {
            tracing::error!(error = %e, "SOS dispatcher task failed");
        }
        tracing::info!("SOS session ended");
    }
}
