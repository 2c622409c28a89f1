use serde::{Deserialize, Serialize};

/// Port the robot broker listens on when the operator gives nothing usable.
pub const DEFAULT_ROBOT_PORT: u16 = 9559;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Start,
    Stop,
}

impl CommandAction {
    pub fn as_path_segment(self) -> &'static str {
        match self {
            CommandAction::Start => "start",
            CommandAction::Stop => "stop",
        }
    }
}

impl std::fmt::Display for CommandAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path_segment())
    }
}

/// A behaviour as the backend reports it: either a bare name or a record
/// carrying at least a `name` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BehaviourDescriptor {
    Name(String),
    Record { name: String },
}

impl BehaviourDescriptor {
    pub fn name(&self) -> &str {
        match self {
            BehaviourDescriptor::Name(name) => name,
            BehaviourDescriptor::Record { name } => name,
        }
    }

    pub fn into_name(self) -> String {
        match self {
            BehaviourDescriptor::Name(name) => name,
            BehaviourDescriptor::Record { name } => name,
        }
    }
}

impl From<&str> for BehaviourDescriptor {
    fn from(value: &str) -> Self {
        BehaviourDescriptor::Name(value.to_string())
    }
}

/// Flattens descriptors to bare names, keeping response order.
pub fn normalize_behaviours(descriptors: Vec<BehaviourDescriptor>) -> Vec<String> {
    descriptors
        .into_iter()
        .map(BehaviourDescriptor::into_name)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorClass {
    Connected,
    Disconnected,
}

impl IndicatorClass {
    pub fn as_css_class(self) -> &'static str {
        match self {
            IndicatorClass::Connected => "connected",
            IndicatorClass::Disconnected => "disconnected",
        }
    }
}

/// The outcome of any project source: the server-confirmed path and the
/// behaviour names found there.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectResolution {
    pub path: String,
    pub behaviours: Vec<String>,
}

impl ProjectResolution {
    pub fn new(path: impl Into<String>, descriptors: Vec<BehaviourDescriptor>) -> Self {
        Self {
            path: path.into(),
            behaviours: normalize_behaviours(descriptors),
        }
    }
}

/// Parses operator-entered port text, falling back to the broker default.
pub fn parse_robot_port(raw: &str) -> u16 {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => DEFAULT_ROBOT_PORT,
        Ok(port) => port,
    }
}
