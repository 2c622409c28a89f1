//! Connection status polling and the connect/disconnect toggle.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use shared::{
    domain::{parse_robot_port, IndicatorClass},
    protocol::{ConnectRequest, StatusResponse},
};
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, warn};

use crate::{
    controls::{ActionOutcome, Control, ControlSnapshot},
    oplog::OperationLog,
    transport::RobotApi,
    ConsoleEvent,
};

pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(5000);
pub const SERVER_UNREACHABLE_TEXT: &str = "✗ Napaka pri povezavi s strežnikom";
const INITIAL_STATUS_TEXT: &str = "Preverjam povezavo...";
const CONNECT_LABEL: &str = "🔌 Poveži";
const DISCONNECT_LABEL: &str = "✖ Prekini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub class: IndicatorClass,
    pub text: String,
}

impl StatusSnapshot {
    fn from_status(status: &StatusResponse) -> Self {
        if status.connected {
            Self {
                class: IndicatorClass::Connected,
                text: format!("✓ {}", status.message),
            }
        } else {
            Self {
                class: IndicatorClass::Disconnected,
                text: format!("✗ {}", status.message),
            }
        }
    }

    fn unreachable() -> Self {
        Self {
            class: IndicatorClass::Disconnected,
            text: SERVER_UNREACHABLE_TEXT.to_string(),
        }
    }
}

/// Connect/disconnect control. Its armed state follows the last status poll,
/// never the outcome of its own command.
#[derive(Debug)]
pub struct ConnectToggle {
    control: Arc<Control>,
    connected: AtomicBool,
}

impl ConnectToggle {
    fn new() -> Self {
        Self {
            control: Control::new(CONNECT_LABEL),
            connected: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn is_disabled(&self) -> bool {
        self.control.is_disabled()
    }

    pub fn label(&self) -> &'static str {
        if self.is_connected() {
            DISCONNECT_LABEL
        } else {
            CONNECT_LABEL
        }
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            label: self.label().to_string(),
            disabled: self.is_disabled(),
        }
    }
}

pub struct StatusPoller {
    api: Arc<dyn RobotApi>,
    indicator: Mutex<StatusSnapshot>,
    toggle: Option<ConnectToggle>,
    interval: Duration,
    events: broadcast::Sender<ConsoleEvent>,
}

impl StatusPoller {
    pub fn new(
        api: Arc<dyn RobotApi>,
        interval: Duration,
        events: broadcast::Sender<ConsoleEvent>,
    ) -> Self {
        Self {
            api,
            indicator: Mutex::new(StatusSnapshot {
                class: IndicatorClass::Disconnected,
                text: INITIAL_STATUS_TEXT.to_string(),
            }),
            toggle: None,
            interval,
            events,
        }
    }

    pub fn with_connect_toggle(mut self) -> Self {
        self.toggle = Some(ConnectToggle::new());
        self
    }

    fn indicator(&self) -> MutexGuard<'_, StatusSnapshot> {
        self.indicator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.indicator().clone()
    }

    pub fn connect_toggle(&self) -> Option<&ConnectToggle> {
        self.toggle.as_ref()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One status fetch, bounded by the poll interval. Never fails: trouble
    /// is logged and shown as the unreachable indicator.
    pub async fn refresh(&self) {
        let bound = self.interval.max(Duration::from_millis(1));
        let Ok(fetched) = time::timeout(bound, self.api.status()).await else {
            warn!(timeout_ms = bound.as_millis() as u64, "status poll timed out");
            self.publish(StatusSnapshot::unreachable());
            return;
        };
        match fetched {
            Ok(status) => {
                if let Some(toggle) = &self.toggle {
                    toggle.connected.store(status.connected, Ordering::SeqCst);
                }
                self.publish(StatusSnapshot::from_status(&status));
            }
            Err(err) => {
                error!(error = %err, "status poll failed");
                self.publish(StatusSnapshot::unreachable());
            }
        }
    }

    fn publish(&self, snapshot: StatusSnapshot) {
        *self.indicator() = snapshot.clone();
        let _ = self.events.send(ConsoleEvent::StatusChanged(snapshot));
    }

    /// Fetches immediately, then once per interval for as long as the
    /// handle lives. Each tick runs its fetch as its own task, so a slow
    /// backend never delays the cadence; whichever response lands last wins.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let poller = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = time::interval(poller.interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let tick = Arc::clone(&poller);
                tokio::spawn(async move { tick.refresh().await });
            }
        })
    }

    /// Connects or disconnects depending on the last polled state, then
    /// re-reads status whatever the command reported.
    pub async fn toggle_connection(
        &self,
        log: &OperationLog,
        ip: &str,
        port: &str,
    ) -> ActionOutcome {
        let Some(toggle) = &self.toggle else {
            warn!("connection toggle requested on a console without one");
            return ActionOutcome::Unavailable;
        };
        let Some(in_flight) = toggle.control.try_begin(toggle.label()) else {
            debug!("connection toggle already in flight");
            return ActionOutcome::Busy;
        };

        let outcome = if toggle.is_connected() {
            let outcome = ActionOutcome::from_command(self.api.disconnect().await);
            match &outcome {
                ActionOutcome::Succeeded => log.success("✓ Prekinjena povezava"),
                ActionOutcome::Rejected(message) => {
                    log.error(format!("✗ Napaka pri prekinitvi: {message}"))
                }
                other => {
                    error!(outcome = ?other, "disconnect request failed");
                    log.error("Napaka pri povezanju/prekinitvi")
                }
            };
            outcome
        } else {
            let request = ConnectRequest {
                ip: ip.trim().to_string(),
                port: parse_robot_port(port),
            };
            debug!(ip = %request.ip, port = request.port, "connecting robot");
            let outcome = ActionOutcome::from_command(self.api.connect(request).await);
            match &outcome {
                ActionOutcome::Succeeded => log.success("✓ Povezava uspešna"),
                ActionOutcome::Rejected(message) => {
                    log.error(format!("✗ Povezava ni uspela: {message}"))
                }
                other => {
                    error!(outcome = ?other, "connect request failed");
                    log.error("Napaka pri povezanju/prekinitvi")
                }
            };
            outcome
        };

        drop(in_flight);
        self.refresh().await;
        outcome
    }
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
