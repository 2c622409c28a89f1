//! Client-side synchronization and command dispatch for the RoboStik
//! behaviour backend: status polling, project resolution, start/stop
//! dispatch with per-control locking, and a bounded operator log.

pub mod console;
pub mod controls;
pub mod dispatcher;
pub mod error;
pub mod oplog;
pub mod project;
pub mod registry;
pub mod status;
pub mod transport;

pub use console::{Console, ConsoleOptions, ConsoleRole};
pub use controls::{ActionOutcome, Control, ControlSnapshot, InFlight};
pub use dispatcher::{CommandDispatcher, RunningBook};
pub use error::{ClientError, ClientResult};
pub use oplog::{LogEntry, OperationLog, Severity, LOG_CAPACITY};
pub use project::ProjectSource;
pub use registry::{BehaviourCard, BehaviourRegistry, CardSnapshot, RegistrySnapshot};
pub use status::{ConnectToggle, StatusPoller, StatusSnapshot, STATUS_POLL_INTERVAL};
pub use transport::{HttpRobotApi, RobotApi, REQUEST_TIMEOUT};

/// Everything a console front end needs to redraw.
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    StatusChanged(StatusSnapshot),
    LogAppended(LogEntry),
    RegistryRebuilt(RegistrySnapshot),
    ProjectPathChanged(String),
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
