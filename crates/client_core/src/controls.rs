//! Disable-able controls: the only locking the console needs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{error::Acknowledged, protocol::CommandResponse};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSnapshot {
    pub label: String,
    pub disabled: bool,
}

/// A control that is either idle (enabled, idle label) or carrying exactly
/// one in-flight request (disabled, busy label).
#[derive(Debug)]
pub struct Control {
    idle_label: String,
    busy_label: Mutex<Option<String>>,
}

impl Control {
    pub fn new(idle_label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            idle_label: idle_label.into(),
            busy_label: Mutex::new(None),
        })
    }

    fn state(&self) -> MutexGuard<'_, Option<String>> {
        self.busy_label.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Disables the control, or returns `None` if it already is.
    pub fn try_begin(self: &Arc<Self>, busy_label: &str) -> Option<InFlight> {
        let mut state = self.state();
        if state.is_some() {
            return None;
        }
        *state = Some(busy_label.to_string());
        Some(InFlight {
            control: Arc::clone(self),
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.state().is_some()
    }

    pub fn idle_label(&self) -> &str {
        &self.idle_label
    }

    pub fn label(&self) -> String {
        self.state()
            .clone()
            .unwrap_or_else(|| self.idle_label.clone())
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        let state = self.state();
        ControlSnapshot {
            label: state.clone().unwrap_or_else(|| self.idle_label.clone()),
            disabled: state.is_some(),
        }
    }
}

/// Held for the duration of one request. Dropping it re-enables the control
/// and restores the idle label on every exit path, cancellation included.
#[derive(Debug)]
#[must_use = "the control re-enables as soon as this guard is dropped"]
pub struct InFlight {
    control: Arc<Control>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        *self.control.state() = None;
    }
}

/// How a single control-triggered request settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The control was already disabled; nothing was sent.
    Busy,
    /// This console has no such control; nothing was sent.
    Unavailable,
    Succeeded,
    /// `success: false` with the server's message.
    Rejected(String),
    /// Transport or decoding failure.
    Failed(String),
}

impl ActionOutcome {
    pub(crate) fn from_command(result: ClientResult<CommandResponse>) -> Self {
        match result.and_then(|response| response.into_result().map_err(ClientError::from)) {
            Ok(_) => ActionOutcome::Succeeded,
            Err(ClientError::Rejected(failure)) => ActionOutcome::Rejected(failure.message),
            Err(err) => ActionOutcome::Failed(err.to_string()),
        }
    }
}
