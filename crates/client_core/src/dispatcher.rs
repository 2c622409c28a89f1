//! Start/stop dispatch with per-control in-flight locking.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::domain::CommandAction;
use tracing::{debug, error, info};

use crate::{
    controls::{ActionOutcome, Control},
    oplog::OperationLog,
    transport::RobotApi,
};

pub const START_LABEL: &str = "▶";
pub const STOP_LABEL: &str = "⏹";
pub const BUSY_LABEL: &str = "⏳";

pub fn idle_label(action: CommandAction) -> &'static str {
    match action {
        CommandAction::Start => START_LABEL,
        CommandAction::Stop => STOP_LABEL,
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct BookEntry {
    running: bool,
    /// Bumped whenever a stop is issued, whatever its outcome.
    stops: u64,
}

/// Which behaviours this console believes are running. Bookkeeping only;
/// nothing is re-rendered from it.
///
/// When a start and a stop for one name overlap, stop wins: a start that
/// succeeds after a stop for the same name was issued since the start
/// leaves the behaviour marked stopped, even if that stop was refused.
#[derive(Debug, Default)]
pub struct RunningBook {
    entries: Mutex<HashMap<String, BookEntry>>,
}

impl RunningBook {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, BookEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.entries()
            .get(name)
            .map(|entry| entry.running)
            .unwrap_or(false)
    }

    pub fn running(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries()
            .iter()
            .filter(|(_, entry)| entry.running)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn stop_generation(&self, name: &str) -> u64 {
        self.entries().get(name).map(|entry| entry.stops).unwrap_or(0)
    }

    fn mark_started(&self, name: &str, issued_at_generation: u64) -> bool {
        let mut entries = self.entries();
        let entry = entries.entry(name.to_string()).or_default();
        if entry.stops != issued_at_generation {
            return false;
        }
        entry.running = true;
        true
    }

    fn note_stop_issued(&self, name: &str) {
        self.entries().entry(name.to_string()).or_default().stops += 1;
    }

    fn mark_stopped(&self, name: &str) {
        self.entries().entry(name.to_string()).or_default().running = false;
    }
}

pub struct CommandDispatcher {
    api: Arc<dyn RobotApi>,
    log: Arc<OperationLog>,
    book: Arc<RunningBook>,
}

impl CommandDispatcher {
    pub fn new(api: Arc<dyn RobotApi>, log: Arc<OperationLog>) -> Self {
        Self {
            api,
            log,
            book: Arc::new(RunningBook::default()),
        }
    }

    pub fn running_book(&self) -> &Arc<RunningBook> {
        &self.book
    }

    /// Issues one start or stop for `name` through `control`. A control that
    /// is already disabled refuses the call without touching the network.
    pub async fn dispatch(
        &self,
        name: &str,
        action: CommandAction,
        control: &Arc<Control>,
    ) -> ActionOutcome {
        let Some(_in_flight) = control.try_begin(BUSY_LABEL) else {
            debug!(behaviour = name, %action, "command already in flight");
            return ActionOutcome::Busy;
        };

        if action == CommandAction::Stop {
            self.book.note_stop_issued(name);
        }
        let generation = self.book.stop_generation(name);
        let outcome =
            ActionOutcome::from_command(self.api.behaviour_command(name, action).await);

        match &outcome {
            ActionOutcome::Succeeded => {
                match action {
                    CommandAction::Start => {
                        if !self.book.mark_started(name, generation) {
                            info!(behaviour = name, "start settled after a newer stop");
                        }
                        self.log.success(format!("Behaviour '{name}' zažet"));
                    }
                    CommandAction::Stop => {
                        self.book.mark_stopped(name);
                        self.log.success(format!("Behaviour '{name}' ustavljen"));
                    }
                };
            }
            ActionOutcome::Rejected(message) => {
                self.log.error(format!("Napaka: {message}"));
            }
            ActionOutcome::Failed(reason) => {
                error!(behaviour = name, %action, error = %reason, "behaviour command failed");
                let message = match action {
                    CommandAction::Start => format!("Napaka pri zagonu '{name}'"),
                    CommandAction::Stop => format!("Napaka pri ustavljanju '{name}'"),
                };
                self.log.error(message);
            }
            ActionOutcome::Busy | ActionOutcome::Unavailable => {}
        }

        outcome
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
