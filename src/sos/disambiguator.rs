//! Single/double press classification for the SOS button.
//!
//! A lone press resolves as [`Resolution::SingleAlert`] once the window
//! has elapsed with no follow-up. A second press strictly inside the
//! window resolves immediately as [`Resolution::DoubleAlert`]. The window
//! is half-open: a gap equal to the window starts a new cycle.
//!
//! The machine never reads a clock. Callers pass press timestamps in
//! milliseconds and deliver the deferred deadline back through
//! [`PressDisambiguator::on_deadline`]; `sos::button` does that with tokio.

use serde::{Deserialize, Serialize};

use crate::models::enums::AlertType;

pub const DEFAULT_WINDOW_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    SingleAlert,
    DoubleAlert,
}

impl Resolution {
    pub fn alert_type(&self) -> AlertType {
        match self {
            Self::SingleAlert => AlertType::Single,
            Self::DoubleAlert => AlertType::Double,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState {
    Idle,
    PendingSingle { first_press_at: u64, cycle: u64 },
}

/// A deferred action the caller must arm: call `on_deadline(cycle, ..)`
/// no earlier than `at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub cycle: u64,
    pub at: u64,
}

/// What a single press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PressOutcome {
    /// Emitted now: a double, or the single this press found already expired.
    pub resolved: Option<Resolution>,
    /// Newly armed cycle. Any previously armed deadline is void.
    pub armed: Option<Deadline>,
}

#[derive(Debug, Clone)]
pub struct PressDisambiguator {
    window_ms: u64,
    state: PressState,
    next_cycle: u64,
}

impl Default for PressDisambiguator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl PressDisambiguator {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            state: PressState::Idle,
            next_cycle: 0,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn state(&self) -> PressState {
        self.state
    }

    pub fn pending_deadline(&self) -> Option<Deadline> {
        match self.state {
            PressState::Idle => None,
            PressState::PendingSingle { first_press_at, cycle } => Some(Deadline {
                cycle,
                at: first_press_at.saturating_add(self.window_ms),
            }),
        }
    }

    /// Register one physical press at `at` milliseconds.
    pub fn on_press(&mut self, at: u64) -> PressOutcome {
        match self.state {
            PressState::Idle => PressOutcome {
                resolved: None,
                armed: Some(self.arm(at)),
            },
            PressState::PendingSingle { first_press_at, .. }
                if at.saturating_sub(first_press_at) < self.window_ms =>
            {
                self.state = PressState::Idle;
                tracing::debug!(gap_ms = at.saturating_sub(first_press_at), "SOS double press");
                PressOutcome {
                    resolved: Some(Resolution::DoubleAlert),
                    armed: None,
                }
            }
            PressState::PendingSingle { .. } => {
                // Deadline passed but was not delivered yet: the old cycle is a
                // single, this press opens the next one.
                PressOutcome {
                    resolved: Some(Resolution::SingleAlert),
                    armed: Some(self.arm(at)),
                }
            }
        }
    }

    /// Deliver an armed deadline. Stale cycles and early calls are ignored.
    pub fn on_deadline(&mut self, cycle: u64, now: u64) -> Option<Resolution> {
        match self.pending_deadline() {
            Some(deadline) if deadline.cycle == cycle && now >= deadline.at => {
                self.state = PressState::Idle;
                Some(Resolution::SingleAlert)
            }
            _ => None,
        }
    }

    /// Resolve whatever cycle has expired by `now`, for hosts that poll
    /// instead of arming timers.
    pub fn poll_expired(&mut self, now: u64) -> Option<Resolution> {
        let deadline = self.pending_deadline()?;
        self.on_deadline(deadline.cycle, now)
    }

    /// Drop the pending cycle without emitting. Returns whether one was
    /// pending; calling it on an idle machine is a no-op.
    pub fn cancel(&mut self) -> bool {
        let was_pending = matches!(self.state, PressState::PendingSingle { .. });
        self.state = PressState::Idle;
        was_pending
    }

    fn arm(&mut self, at: u64) -> Deadline {
        let cycle = self.next_cycle;
        self.next_cycle = self.next_cycle.wrapping_add(1);
        self.state = PressState::PendingSingle {
            first_press_at: at,
            cycle,
        };
        Deadline {
            cycle,
            at: at.saturating_add(self.window_ms),
        }
    }
}
