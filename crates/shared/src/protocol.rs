use serde::{Deserialize, Serialize};

use crate::{domain::BehaviourDescriptor, error::Acknowledged};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub connected: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub ip: String,
    pub port: u16,
}

/// Shape shared by connect, disconnect, start and stop.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFolderRequest {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanFolderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub behaviors: Vec<BehaviourDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenProjectResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub path: String,
    /// Present only when the backend already scanned the chosen folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behaviors: Option<Vec<BehaviourDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AllowedPathsResponse {
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LibraryRootResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryProject {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LibraryProjectsResponse {
    #[serde(default)]
    pub projects: Vec<LibraryProject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurrentBehavioursResponse {
    #[serde(default)]
    pub behaviours: Vec<BehaviourDescriptor>,
}

/// Behaviours installed on the robot itself, as `GET /behaviours` lists them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstalledBehavioursResponse {
    #[serde(default)]
    pub behaviours: Vec<BehaviourDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

macro_rules! acknowledged {
    ($name:ident) => {
        impl Acknowledged for $name {
            fn success(&self) -> bool {
                self.success
            }

            fn message(&self) -> Option<&str> {
                self.message.as_deref()
            }
        }
    };
}

acknowledged!(CommandResponse);
acknowledged!(ScanFolderResponse);
acknowledged!(OpenProjectResponse);
acknowledged!(LibraryRootResponse);
