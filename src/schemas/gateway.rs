use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operations the gateway endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    GetRubric,
    Upload,
    Grade,
    Login,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::GetRubric => "get_rubric",
            Self::Upload => "upload",
            Self::Grade => "grade",
            Self::Login => "login",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GatewayEnvelope<'a> {
    pub action: Action,
    pub data: &'a Value,
}

/// Decoded gateway reply. `success: false` is a business failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl GatewayReply {
    pub fn ok(data: Option<Value>) -> Self {
        Self { success: true, data, ..Self::default() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()), ..Self::default() }
    }

    /// Server message, ignoring blank strings.
    pub fn server_message(&self) -> Option<&str> {
        self.message.as_deref().map(str::trim).filter(|message| !message.is_empty())
    }
}
