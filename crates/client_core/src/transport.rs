//! Backend seam: the HTTP operations the console consumes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::CommandAction,
    protocol::{
        AllowedPathsResponse, CommandResponse, ConnectRequest, CurrentBehavioursResponse,
        InstalledBehavioursResponse, LibraryProjectsResponse, LibraryRootResponse, OpenProjectResponse, ScanFolderRequest,
        ScanFolderResponse, StatusResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};

#[async_trait]
pub trait RobotApi: Send + Sync {
    async fn status(&self) -> ClientResult<StatusResponse>;
    async fn connect(&self, request: ConnectRequest) -> ClientResult<CommandResponse>;
    async fn disconnect(&self) -> ClientResult<CommandResponse>;
    async fn scan_folder(&self, path: &str) -> ClientResult<ScanFolderResponse>;
    async fn open_project(&self) -> ClientResult<OpenProjectResponse>;
    async fn allowed_paths(&self) -> ClientResult<AllowedPathsResponse>;
    async fn select_library_root(&self) -> ClientResult<LibraryRootResponse>;
    async fn library_projects(&self) -> ClientResult<LibraryProjectsResponse>;
    async fn behaviour_command(
        &self,
        name: &str,
        action: CommandAction,
    ) -> ClientResult<CommandResponse>;
    async fn current_behaviours(&self) -> ClientResult<CurrentBehavioursResponse>;
    async fn installed_behaviours(&self) -> ClientResult<InstalledBehavioursResponse>;
}

/// Per-request ceiling for the default client; kept below the status
/// poll interval so a silent backend fails before the next tick.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(4000);

pub struct HttpRobotApi {
    http: Client,
    base: Url,
}

impl HttpRobotApi {
    pub fn new(api_base: &str) -> ClientResult<Self> {
        Self::with_timeout(api_base, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(api_base: &str, timeout: Duration) -> ClientResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_client(http, api_base)
    }

    pub fn with_client(http: Client, api_base: &str) -> ClientResult<Self> {
        let raw = api_base.trim();
        let base = Url::parse(raw).map_err(|err| ClientError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: raw.to_string(),
                reason: "url cannot carry path segments".to_string(),
            });
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends percent-encoded segments below the base path.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments);
        debug!(endpoint = %url, "robot api GET");
        let response = self.http.get(url).send().await?;
        decode_body(response).await
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        debug!(endpoint = %url, "robot api POST");
        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        decode_body(request.send().await?).await
    }
}

/// Decodes the JSON body regardless of HTTP status: the backend reports
/// rejections as `success: false` bodies, often with a 4xx status.
async fn decode_body<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let endpoint = response.url().path().to_string();
    let status = response.status();
    let bytes = response.bytes().await?;

    if bytes.is_empty() && !status.is_success() {
        return Err(ClientError::UnexpectedStatus { endpoint, status });
    }

    match serde_json::from_slice(&bytes) {
        Ok(body) => Ok(body),
        Err(_) if !status.is_success() => Err(ClientError::UnexpectedStatus { endpoint, status }),
        Err(source) => Err(ClientError::Malformed { endpoint, source }),
    }
}

#[async_trait]
impl RobotApi for HttpRobotApi {
    async fn status(&self) -> ClientResult<StatusResponse> {
        // The status body has no `success` flag, so a failing status code
        // can never be read as an authoritative answer.
        let url = self.endpoint(&["status"]);
        debug!(endpoint = %url, "robot api GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                endpoint: response.url().path().to_string(),
                status,
            });
        }
        decode_body(response).await
    }

    async fn connect(&self, request: ConnectRequest) -> ClientResult<CommandResponse> {
        self.post_json(&["connect"], Some(&request)).await
    }

    async fn disconnect(&self) -> ClientResult<CommandResponse> {
        self.post_json::<(), _>(&["disconnect"], None).await
    }

    async fn scan_folder(&self, path: &str) -> ClientResult<ScanFolderResponse> {
        let body = ScanFolderRequest {
            path: path.to_string(),
        };
        self.post_json(&["scan-folder"], Some(&body)).await
    }

    async fn open_project(&self) -> ClientResult<OpenProjectResponse> {
        self.get_json(&["open-project"]).await
    }

    async fn allowed_paths(&self) -> ClientResult<AllowedPathsResponse> {
        self.get_json(&["allowed-paths"]).await
    }

    async fn select_library_root(&self) -> ClientResult<LibraryRootResponse> {
        self.get_json(&["library-root", "select"]).await
    }

    async fn library_projects(&self) -> ClientResult<LibraryProjectsResponse> {
        self.get_json(&["library-projects"]).await
    }

    async fn behaviour_command(
        &self,
        name: &str,
        action: CommandAction,
    ) -> ClientResult<CommandResponse> {
        self.post_json::<(), _>(&["behaviours", name, action.as_path_segment()], None)
            .await
    }

    async fn current_behaviours(&self) -> ClientResult<CurrentBehavioursResponse> {
        self.get_json(&["current-behaviours"]).await
    }

    async fn installed_behaviours(&self) -> ClientResult<InstalledBehavioursResponse> {
        self.get_json(&["behaviours"]).await
    }
}
