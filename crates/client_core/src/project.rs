//! Resolving which project, and so which behaviours, the console shows.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::ProjectResolution,
    error::Acknowledged,
    protocol::LibraryProject,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::{
    controls::{Control, ControlSnapshot},
    error::ClientError,
    oplog::OperationLog,
    registry::BehaviourRegistry,
    transport::RobotApi,
    ConsoleEvent,
};

pub const OPEN_PROJECT_LABEL: &str = "📁 Odpri projekt";
const SCANNING_LABEL: &str = "⏳ Skeniram...";
const OPENING_LABEL: &str = "⏳ Odpiram...";

const EMPTY_PATH_MESSAGE: &str = "Vnesite pot do projekta";
const SCAN_FAILED_MESSAGE: &str = "Napaka pri skeniranju behaviourjev";
const DIALOG_FAILED_MESSAGE: &str = "Napaka pri odpiranju dialoga";
const NO_ALLOWED_PATHS_MESSAGE: &str = "Ni dovoljenih poti";
const NO_ALLOWED_SELECTION_MESSAGE: &str = "Izberite pot s seznama";
const ALLOWED_PATHS_FAILED_MESSAGE: &str = "Napaka pri nalaganju dovoljenih poti";
const NO_LIBRARY_PROJECTS_MESSAGE: &str = "Ni projektov v knjižnici";
const NO_LIBRARY_SELECTION_MESSAGE: &str = "Izberite projekt iz knjižnice";
const LIBRARY_FAILED_MESSAGE: &str = "Napaka pri nalaganju knjižnice projektov";
const LIBRARY_ROOT_FAILED_MESSAGE: &str = "Napaka pri izbiri knjižnice";

#[derive(Debug, Default)]
struct SourceState {
    /// What the path field shows: always the last server-confirmed path.
    path_field: String,
    current: Option<ProjectResolution>,
    allowed_paths: Vec<String>,
    library_root: Option<String>,
    library_projects: Vec<LibraryProject>,
}

/// Owner of the currently displayed behaviour list. Every path through here
/// ends in a full registry rebuild or in no change at all.
pub struct ProjectSource {
    api: Arc<dyn RobotApi>,
    log: Arc<OperationLog>,
    registry: Arc<BehaviourRegistry>,
    scan_control: Arc<Control>,
    state: Mutex<SourceState>,
    events: broadcast::Sender<ConsoleEvent>,
}

impl ProjectSource {
    pub fn new(
        api: Arc<dyn RobotApi>,
        log: Arc<OperationLog>,
        registry: Arc<BehaviourRegistry>,
        events: broadcast::Sender<ConsoleEvent>,
    ) -> Self {
        Self {
            api,
            log,
            registry,
            scan_control: Control::new(OPEN_PROJECT_LABEL),
            state: Mutex::new(SourceState::default()),
            events,
        }
    }

    fn state(&self) -> MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn path_field(&self) -> String {
        self.state().path_field.clone()
    }

    pub fn current(&self) -> Option<ProjectResolution> {
        self.state().current.clone()
    }

    pub fn scan_control(&self) -> ControlSnapshot {
        self.scan_control.snapshot()
    }

    pub fn allowed_paths(&self) -> Vec<String> {
        self.state().allowed_paths.clone()
    }

    pub fn library_root(&self) -> Option<String> {
        self.state().library_root.clone()
    }

    pub fn library_projects(&self) -> Vec<LibraryProject> {
        self.state().library_projects.clone()
    }

    fn set_path_field(&self, path: &str) {
        self.state().path_field = path.to_string();
        let _ = self
            .events
            .send(ConsoleEvent::ProjectPathChanged(path.to_string()));
    }

    fn adopt(&self, resolution: ProjectResolution) -> ProjectResolution {
        self.set_path_field(&resolution.path);
        self.state().current = Some(resolution.clone());
        self.registry.render_resolution(&resolution);
        self.log.success(format!(
            "Naloženih {} behaviourjev",
            resolution.behaviours.len()
        ));
        info!(
            path = %resolution.path,
            behaviours = resolution.behaviours.len(),
            "project resolved"
        );
        resolution
    }

    /// Scans `raw_path`. Blank input is an operator error and never reaches
    /// the backend.
    pub async fn scan(&self, raw_path: &str) -> Option<ProjectResolution> {
        let path = raw_path.trim();
        if path.is_empty() {
            self.log.error(EMPTY_PATH_MESSAGE);
            return None;
        }
        let Some(_in_flight) = self.scan_control.try_begin(SCANNING_LABEL) else {
            debug!(path, "project scan already in flight");
            return None;
        };
        self.scan_unlocked(path).await
    }

    async fn scan_unlocked(&self, path: &str) -> Option<ProjectResolution> {
        let response = match self.api.scan_folder(path).await {
            Ok(response) => response,
            Err(err) => {
                error!(path, error = %err, "project scan failed");
                self.log.error(SCAN_FAILED_MESSAGE);
                return None;
            }
        };

        match response.into_result() {
            Ok(response) => {
                let confirmed = if response.path.trim().is_empty() {
                    path.to_string()
                } else {
                    response.path
                };
                Some(self.adopt(ProjectResolution::new(confirmed, response.behaviors)))
            }
            Err(failure) => {
                self.registry.render_message(failure.message.clone());
                self.log.error(format!("✗ {}", failure.message));
                None
            }
        }
    }

    /// Asks the backend to show its folder picker. A response that already
    /// lists behaviours is adopted as-is; otherwise the returned path is
    /// scanned.
    pub async fn open_project(&self) -> Option<ProjectResolution> {
        let Some(_in_flight) = self.scan_control.try_begin(OPENING_LABEL) else {
            debug!("project dialog already in flight");
            return None;
        };

        let response = match self
            .api
            .open_project()
            .await
            .and_then(|response| response.into_result().map_err(ClientError::from))
        {
            Ok(response) => response,
            Err(ClientError::Rejected(failure)) => {
                self.log.error(format!("✗ {}", failure.message));
                return None;
            }
            Err(err) => {
                error!(error = %err, "open project dialog failed");
                self.log.error(DIALOG_FAILED_MESSAGE);
                return None;
            }
        };

        self.set_path_field(&response.path);
        match response.behaviors {
            Some(behaviours) => Some(self.adopt(ProjectResolution::new(response.path, behaviours))),
            None => {
                let path = response.path.trim();
                if path.is_empty() {
                    self.log.error(EMPTY_PATH_MESSAGE);
                    return None;
                }
                self.scan_unlocked(path).await
            }
        }
    }

    pub async fn refresh_allowed_paths(&self) -> Vec<String> {
        match self.api.allowed_paths().await {
            Ok(response) => {
                self.state().allowed_paths = response.paths.clone();
                response.paths
            }
            Err(err) => {
                error!(error = %err, "allowed paths request failed");
                self.log.error(ALLOWED_PATHS_FAILED_MESSAGE);
                self.allowed_paths()
            }
        }
    }

    /// Scans the allowed path at `selection`.
    pub async fn apply_allowed_path(&self, selection: Option<usize>) -> Option<ProjectResolution> {
        let chosen = {
            let state = self.state();
            if state.allowed_paths.is_empty() {
                Err(NO_ALLOWED_PATHS_MESSAGE)
            } else {
                selection
                    .and_then(|index| state.allowed_paths.get(index).cloned())
                    .ok_or(NO_ALLOWED_SELECTION_MESSAGE)
            }
        };
        match chosen {
            Ok(path) => self.scan(&path).await,
            Err(message) => {
                self.log.error(message);
                None
            }
        }
    }

    pub async fn refresh_library_projects(&self) -> Vec<LibraryProject> {
        match self.api.library_projects().await {
            Ok(response) => {
                if response.projects.is_empty() {
                    if let Some(message) = response.message.as_deref() {
                        self.log.info(message);
                    }
                }
                self.state().library_projects = response.projects.clone();
                response.projects
            }
            Err(err) => {
                error!(error = %err, "library projects request failed");
                self.log.error(LIBRARY_FAILED_MESSAGE);
                self.library_projects()
            }
        }
    }

    /// Lets the backend pick a new library root, then reloads the project
    /// list under it.
    pub async fn select_library_root(&self) -> Option<String> {
        let response = match self
            .api
            .select_library_root()
            .await
            .and_then(|response| response.into_result().map_err(ClientError::from))
        {
            Ok(response) => response,
            Err(ClientError::Rejected(failure)) => {
                self.log.error(format!("✗ {}", failure.message));
                return None;
            }
            Err(err) => {
                error!(error = %err, "library root selection failed");
                self.log.error(LIBRARY_ROOT_FAILED_MESSAGE);
                return None;
            }
        };

        self.state().library_root = Some(response.path.clone());
        self.log.success(format!("✓ Knjižnica: {}", response.path));
        self.refresh_library_projects().await;
        Some(response.path)
    }

    /// Scans the library project at `selection`.
    pub async fn apply_library_project(
        &self,
        selection: Option<usize>,
    ) -> Option<ProjectResolution> {
        let chosen = {
            let state = self.state();
            if state.library_projects.is_empty() {
                Err(NO_LIBRARY_PROJECTS_MESSAGE)
            } else {
                selection
                    .and_then(|index| state.library_projects.get(index))
                    .map(|project| project.path.clone())
                    .ok_or(NO_LIBRARY_SELECTION_MESSAGE)
            }
        };
        match chosen {
            Ok(path) => self.scan(&path).await,
            Err(message) => {
                self.log.error(message);
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/project_tests.rs"]
mod tests;
