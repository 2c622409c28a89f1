use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::CommandAction,
    protocol::{
        AllowedPathsResponse, CommandResponse, ConnectRequest, CurrentBehavioursResponse,
        InstalledBehavioursResponse, LibraryProjectsResponse, LibraryRootResponse, OpenProjectResponse, ScanFolderResponse,
        StatusResponse,
    },
};
use tokio::sync::Notify;

use crate::{
    error::{ClientError, ClientResult},
    transport::RobotApi,
};

/// `None` scripts a transport-class failure for that call.
pub(crate) type Scripted<T> = Option<T>;

type CommandKey = (String, CommandAction);

/// In-memory backend with scripted replies and optional gates that hold a
/// behaviour command in flight until the test releases it.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    calls: Mutex<Vec<String>>,
    statuses: Mutex<VecDeque<Scripted<StatusResponse>>>,
    commands: Mutex<HashMap<CommandKey, Scripted<CommandResponse>>>,
    gates: Mutex<HashMap<CommandKey, Arc<Notify>>>,
    status_gate: Mutex<Option<Arc<Notify>>>,
    connect: Mutex<Option<Scripted<CommandResponse>>>,
    disconnect: Mutex<Option<Scripted<CommandResponse>>>,
    scans: Mutex<HashMap<String, Scripted<ScanFolderResponse>>>,
    open_project: Mutex<Option<Scripted<OpenProjectResponse>>>,
    allowed_paths: Mutex<Option<Scripted<AllowedPathsResponse>>>,
    library_root: Mutex<Option<Scripted<LibraryRootResponse>>>,
    library_projects: Mutex<Option<Scripted<LibraryProjectsResponse>>>,
    current: Mutex<Option<Scripted<CurrentBehavioursResponse>>>,
    installed: Mutex<Option<Scripted<InstalledBehavioursResponse>>>,
    connect_requests: Mutex<Vec<ConnectRequest>>,
}

fn unavailable<T>(endpoint: &str) -> ClientResult<T> {
    Err(ClientError::UnexpectedStatus {
        endpoint: endpoint.to_string(),
        status: StatusCode::SERVICE_UNAVAILABLE,
    })
}

fn reply<T: Clone>(endpoint: &str, scripted: Option<&Scripted<T>>, default: T) -> ClientResult<T> {
    match scripted {
        None => Ok(default),
        Some(Some(value)) => Ok(value.clone()),
        Some(None) => unavailable(endpoint),
    }
}

impl ScriptedApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub(crate) fn push_status(&self, status: Scripted<StatusResponse>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    /// Holds every status fetch until the returned gate is notified.
    pub(crate) fn hold_status(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.status_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn script_command(
        &self,
        name: &str,
        action: CommandAction,
        response: Scripted<CommandResponse>,
    ) {
        self.commands
            .lock()
            .unwrap()
            .insert((name.to_string(), action), response);
    }

    /// Holds `name`/`action` in flight until the returned gate is notified.
    pub(crate) fn hold(&self, name: &str, action: CommandAction) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert((name.to_string(), action), Arc::clone(&gate));
        gate
    }

    pub(crate) fn script_connect(&self, response: Scripted<CommandResponse>) {
        *self.connect.lock().unwrap() = Some(response);
    }

    pub(crate) fn script_disconnect(&self, response: Scripted<CommandResponse>) {
        *self.disconnect.lock().unwrap() = Some(response);
    }

    pub(crate) fn connect_requests(&self) -> Vec<ConnectRequest> {
        self.connect_requests.lock().unwrap().clone()
    }

    pub(crate) fn script_scan(&self, path: &str, response: Scripted<ScanFolderResponse>) {
        self.scans
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    pub(crate) fn script_open_project(&self, response: Scripted<OpenProjectResponse>) {
        *self.open_project.lock().unwrap() = Some(response);
    }

    pub(crate) fn script_allowed_paths(&self, paths: &[&str]) {
        *self.allowed_paths.lock().unwrap() = Some(Some(AllowedPathsResponse {
            paths: paths.iter().map(|path| path.to_string()).collect(),
        }));
    }

    pub(crate) fn script_library_root(&self, response: Scripted<LibraryRootResponse>) {
        *self.library_root.lock().unwrap() = Some(response);
    }

    pub(crate) fn script_library_projects(&self, response: Scripted<LibraryProjectsResponse>) {
        *self.library_projects.lock().unwrap() = Some(response);
    }

    pub(crate) fn script_current(&self, response: Scripted<CurrentBehavioursResponse>) {
        *self.current.lock().unwrap() = Some(response);
    }

    pub(crate) fn script_installed(&self, response: Scripted<InstalledBehavioursResponse>) {
        *self.installed.lock().unwrap() = Some(response);
    }
}

pub(crate) fn scan_ok(path: &str, behaviours: &[&str]) -> ScanFolderResponse {
    ScanFolderResponse {
        success: true,
        path: path.to_string(),
        behaviors: behaviours.iter().map(|name| (*name).into()).collect(),
        message: None,
    }
}

#[async_trait]
impl RobotApi for ScriptedApi {
    async fn status(&self) -> ClientResult<StatusResponse> {
        self.record("GET /status");
        let gate = self.status_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(Some(status)) => Ok(status),
            _ => unavailable("/status"),
        }
    }

    async fn connect(&self, request: ConnectRequest) -> ClientResult<CommandResponse> {
        self.record("POST /connect");
        self.connect_requests.lock().unwrap().push(request);
        let scripted = self.connect.lock().unwrap().clone();
        reply("/connect", scripted.as_ref(), CommandResponse::ok())
    }

    async fn disconnect(&self) -> ClientResult<CommandResponse> {
        self.record("POST /disconnect");
        let scripted = self.disconnect.lock().unwrap().clone();
        reply("/disconnect", scripted.as_ref(), CommandResponse::ok())
    }

    async fn scan_folder(&self, path: &str) -> ClientResult<ScanFolderResponse> {
        self.record(format!("POST /scan-folder {path}"));
        let scripted = self.scans.lock().unwrap().get(path).cloned();
        let default = ScanFolderResponse {
            success: false,
            message: Some(format!("mapa {path} ne obstaja")),
            ..ScanFolderResponse::default()
        };
        reply("/scan-folder", scripted.as_ref(), default)
    }

    async fn open_project(&self) -> ClientResult<OpenProjectResponse> {
        self.record("GET /open-project");
        let scripted = self.open_project.lock().unwrap().clone();
        match scripted {
            Some(scripted) => reply("/open-project", Some(&scripted), OpenProjectResponse::default()),
            None => unavailable("/open-project"),
        }
    }

    async fn allowed_paths(&self) -> ClientResult<AllowedPathsResponse> {
        self.record("GET /allowed-paths");
        let scripted = self.allowed_paths.lock().unwrap().clone();
        reply("/allowed-paths", scripted.as_ref(), AllowedPathsResponse::default())
    }

    async fn select_library_root(&self) -> ClientResult<LibraryRootResponse> {
        self.record("GET /library-root/select");
        let scripted = self.library_root.lock().unwrap().clone();
        reply("/library-root/select", scripted.as_ref(), LibraryRootResponse::default())
    }

    async fn library_projects(&self) -> ClientResult<LibraryProjectsResponse> {
        self.record("GET /library-projects");
        let scripted = self.library_projects.lock().unwrap().clone();
        reply("/library-projects", scripted.as_ref(), LibraryProjectsResponse::default())
    }

    async fn behaviour_command(
        &self,
        name: &str,
        action: CommandAction,
    ) -> ClientResult<CommandResponse> {
        self.record(format!("POST /behaviours/{name}/{action}"));
        let key = (name.to_string(), action);
        let gate = self.gates.lock().unwrap().get(&key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let scripted = self.commands.lock().unwrap().get(&key).cloned();
        reply("/behaviours", scripted.as_ref(), CommandResponse::ok())
    }

    async fn current_behaviours(&self) -> ClientResult<CurrentBehavioursResponse> {
        self.record("GET /current-behaviours");
        let scripted = self.current.lock().unwrap().clone();
        reply(
            "/current-behaviours",
            scripted.as_ref(),
            CurrentBehavioursResponse::default(),
        )
    }

    async fn installed_behaviours(&self) -> ClientResult<InstalledBehavioursResponse> {
        self.record("GET /behaviours");
        let scripted = self.installed.lock().unwrap().clone();
        reply(
            "/behaviours",
            scripted.as_ref(),
            InstalledBehavioursResponse::default(),
        )
    }
}
