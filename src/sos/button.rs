//! Tokio runtime for the SOS press disambiguator.
//!
//! Owns the pending deferred action as a spawned sleep task. A press takes
//! the lock, aborts that task and evaluates the window in one step, so one
//! physical press can never produce both a single and a double. The timer
//! task re-checks its cycle under the same lock before emitting.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::disambiguator::{Deadline, PressDisambiguator, PressOutcome, Resolution};
use crate::config::PrismConfig;

#[derive(Error, Debug)]
pub enum ButtonError {
    #[error("SOS button must be created inside a tokio runtime")]
    NoRuntime,
    #[error("Internal lock error")]
    LockPoisoned,
}

struct ButtonInner {
    machine: PressDisambiguator,
    timer: Option<JoinHandle<()>>,
}

/// One dashboard session's SOS button.
///
/// Resolutions arrive on the receiver returned by [`SosButton::new`].
/// Dropping the button cancels any pending single.
pub struct SosButton {
    inner: Arc<Mutex<ButtonInner>>,
    origin: Instant,
    runtime: Handle,
    tx: mpsc::UnboundedSender<Resolution>,
}

impl SosButton {
    pub fn new(
        window: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Resolution>), ButtonError> {
        let runtime = Handle::try_current().map_err(|_| ButtonError::NoRuntime)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);

        let button = Self {
            inner: Arc::new(Mutex::new(ButtonInner {
                machine: PressDisambiguator::new(window_ms),
                timer: None,
            })),
            origin: Instant::now(),
            runtime,
            tx,
        };
        Ok((button, rx))
    }

    /// Button using the configured `sos_window_ms`.
    pub fn from_config(
        config: &PrismConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Resolution>), ButtonError> {
        Self::new(Duration::from_millis(config.sos_window_ms))
    }

    /// Register one physical press.
    pub fn press(&self) -> Result<(), ButtonError> {
        let mut inner = self.lock()?;
        let now = self.elapsed_ms();
        let outcome: PressOutcome = inner.machine.on_press(now);

        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        if let Some(resolution) = outcome.resolved {
            emit(&self.tx, resolution);
        }
        if let Some(deadline) = outcome.armed {
            inner.timer = Some(self.arm(deadline));
        }
        Ok(())
    }

    /// Drop any pending single without emitting. Safe to call repeatedly.
    pub fn cancel(&self) -> Result<bool, ButtonError> {
        let mut inner = self.lock()?;
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        let was_pending = inner.machine.cancel();
        if was_pending {
            tracing::debug!("Pending SOS press cancelled");
        }
        Ok(was_pending)
    }

    pub fn is_pending(&self) -> bool {
        self.lock()
            .map(|inner| inner.machine.pending_deadline().is_some())
            .unwrap_or(false)
    }

    fn arm(&self, deadline: Deadline) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let tx = self.tx.clone();
        let origin = self.origin;

        self.runtime.spawn(async move {
            tokio::time::sleep_until(origin + Duration::from_millis(deadline.at)).await;

            let Ok(mut guard) = inner.lock() else {
                tracing::error!("SOS button lock poisoned, dropping deadline");
                return;
            };
            let now = millis_since(origin);
            if let Some(resolution) = guard.machine.on_deadline(deadline.cycle, now) {
                guard.timer = None;
                emit(&tx, resolution);
            }
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ButtonInner>, ButtonError> {
        self.inner.lock().map_err(|_| ButtonError::LockPoisoned)
    }

    fn elapsed_ms(&self) -> u64 {
        millis_since(self.origin)
    }
}

impl Drop for SosButton {
    fn drop(&mut self) {
        if let Err(e) = self.cancel() {
            tracing::warn!(error = %e, "SOS button teardown could not cancel pending press");
        }
    }
}

fn millis_since(origin: Instant) -> u64 {
    u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn emit(tx: &mpsc::UnboundedSender<Resolution>, resolution: Resolution) {
    tracing::info!(?resolution, "SOS press resolved");
    if tx.send(resolution).is_err() {
        tracing::debug!("SOS resolution dropped: no listener");
    }
}
