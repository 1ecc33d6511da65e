use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub pin: String,
}

/// A teacher who passed the username/PIN check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherSession {
    pub username: String,
    pub teacher_name: String,
}
