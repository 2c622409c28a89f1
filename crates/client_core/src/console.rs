//! Role wiring: one admin, remote or operator console around a shared event bus.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use shared::domain::normalize_behaviours;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info};

use crate::{
    controls::{ActionOutcome, Control, ControlSnapshot},
    dispatcher::CommandDispatcher,
    oplog::{OperationLog, LOG_CAPACITY},
    project::ProjectSource,
    registry::{BehaviourRegistry, ADMIN_PLACEHOLDER, OPERATOR_PLACEHOLDER, REMOTE_PLACEHOLDER},
    status::{StatusPoller, STATUS_POLL_INTERVAL},
    transport::RobotApi,
    ConsoleEvent,
};

const REFRESH_LABEL: &str = "🔄 Osveži";
const REFRESHING_LABEL: &str = "⏳ Osvežujem...";
const LOAD_BEHAVIOURS_FAILED_MESSAGE: &str = "Napaka pri nalaganju behaviourjev";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleRole {
    /// Scans and opens projects, connects the robot.
    #[default]
    Admin,
    /// Follows whatever behaviours the backend currently holds.
    Remote,
    /// Runs the behaviours installed on the robot itself.
    Operator,
}

impl std::str::FromStr for ConsoleRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(ConsoleRole::Admin),
            "remote" => Ok(ConsoleRole::Remote),
            "operator" => Ok(ConsoleRole::Operator),
            other => Err(format!("unknown console role '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    pub poll_interval: Duration,
    pub log_capacity: usize,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            poll_interval: STATUS_POLL_INTERVAL,
            log_capacity: LOG_CAPACITY,
        }
    }
}

pub struct Console {
    role: ConsoleRole,
    api: Arc<dyn RobotApi>,
    events: broadcast::Sender<ConsoleEvent>,
    log: Arc<OperationLog>,
    status: Arc<StatusPoller>,
    dispatcher: Arc<CommandDispatcher>,
    registry: Arc<BehaviourRegistry>,
    project: Option<Arc<ProjectSource>>,
    refresh_control: Arc<Control>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl Console {
    pub fn admin(api: Arc<dyn RobotApi>, options: ConsoleOptions) -> Arc<Self> {
        Self::new(ConsoleRole::Admin, api, options)
    }

    pub fn remote(api: Arc<dyn RobotApi>, options: ConsoleOptions) -> Arc<Self> {
        Self::new(ConsoleRole::Remote, api, options)
    }

    pub fn new(role: ConsoleRole, api: Arc<dyn RobotApi>, options: ConsoleOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        let log = Arc::new(OperationLog::new(options.log_capacity, events.clone()));

        let mut status = StatusPoller::new(Arc::clone(&api), options.poll_interval, events.clone());
        if role == ConsoleRole::Admin {
            status = status.with_connect_toggle();
        }

        let dispatcher = Arc::new(CommandDispatcher::new(Arc::clone(&api), Arc::clone(&log)));
        let placeholder = match role {
            ConsoleRole::Admin => ADMIN_PLACEHOLDER,
            ConsoleRole::Remote => REMOTE_PLACEHOLDER,
            ConsoleRole::Operator => OPERATOR_PLACEHOLDER,
        };
        let registry = Arc::new(BehaviourRegistry::new(
            Arc::clone(&dispatcher),
            placeholder,
            events.clone(),
        ));
        let project = (role == ConsoleRole::Admin).then(|| {
            Arc::new(ProjectSource::new(
                Arc::clone(&api),
                Arc::clone(&log),
                Arc::clone(&registry),
                events.clone(),
            ))
        });

        Arc::new(Self {
            role,
            api,
            events,
            log,
            status: Arc::new(status),
            dispatcher,
            registry,
            project,
            refresh_control: Control::new(REFRESH_LABEL),
            poll_task: Mutex::new(None),
        })
    }

    /// Starts the status cadence and, outside the admin role, the initial
    /// behaviour load. Calling it twice keeps the first poller.
    pub fn start(self: &Arc<Self>) {
        {
            let mut poll_task = self.poll_task.lock().unwrap_or_else(PoisonError::into_inner);
            if poll_task.is_some() {
                debug!("console already started");
                return;
            }
            *poll_task = Some(self.status.spawn());
        }
        info!(role = ?self.role, "console started");

        if self.role != ConsoleRole::Admin {
            let console = Arc::clone(self);
            tokio::spawn(async move {
                console.reload_behaviours().await;
            });
        }
    }

    pub fn role(&self) -> ConsoleRole {
        self.role
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.events.subscribe()
    }

    pub fn log(&self) -> &Arc<OperationLog> {
        &self.log
    }

    pub fn status(&self) -> &Arc<StatusPoller> {
        &self.status
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    pub fn registry(&self) -> &Arc<BehaviourRegistry> {
        &self.registry
    }

    /// Present on the admin console only.
    pub fn project(&self) -> Option<&Arc<ProjectSource>> {
        self.project.as_ref()
    }

    pub fn refresh_control(&self) -> ControlSnapshot {
        self.refresh_control.snapshot()
    }

    pub async fn toggle_connection(&self, ip: &str, port: &str) -> ActionOutcome {
        self.status.toggle_connection(&self.log, ip, port).await
    }

    /// Reloads the registry from the source this role follows. The admin
    /// console loads through its project source instead.
    pub async fn reload_behaviours(&self) -> ActionOutcome {
        match self.role {
            ConsoleRole::Admin => ActionOutcome::Unavailable,
            ConsoleRole::Remote => self.refresh_current_behaviours().await,
            ConsoleRole::Operator => self.load_installed_behaviours().await,
        }
    }

    /// Reloads the registry from the backend's current behaviour set.
    pub async fn refresh_current_behaviours(&self) -> ActionOutcome {
        let Some(_in_flight) = self.refresh_control.try_begin(REFRESHING_LABEL) else {
            debug!("current behaviours refresh already in flight");
            return ActionOutcome::Busy;
        };

        match self.api.current_behaviours().await {
            Ok(response) => {
                self.registry.render(&normalize_behaviours(response.behaviours));
                ActionOutcome::Succeeded
            }
            Err(err) => {
                error!(error = %err, "current behaviours request failed");
                self.log.error(LOAD_BEHAVIOURS_FAILED_MESSAGE);
                ActionOutcome::Failed(err.to_string())
            }
        }
    }

    /// Loads the robot's installed behaviours. A failure replaces the list
    /// with the failure text.
    pub async fn load_installed_behaviours(&self) -> ActionOutcome {
        let Some(_in_flight) = self.refresh_control.try_begin(REFRESHING_LABEL) else {
            debug!("installed behaviours load already in flight");
            return ActionOutcome::Busy;
        };

        match self.api.installed_behaviours().await {
            Ok(response) => {
                let names = normalize_behaviours(response.behaviours);
                self.registry.render(&names);
                if !names.is_empty() {
                    let count = response.count.unwrap_or(names.len());
                    self.log.success(format!("Naloženih {count} behaviourjev"));
                }
                ActionOutcome::Succeeded
            }
            Err(err) => {
                error!(error = %err, "installed behaviours request failed");
                self.log.error(LOAD_BEHAVIOURS_FAILED_MESSAGE);
                self.registry.render_message(LOAD_BEHAVIOURS_FAILED_MESSAGE);
                ActionOutcome::Failed(err.to_string())
            }
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        let poll_task = self
            .poll_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = poll_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
