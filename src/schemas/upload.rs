use serde::Serialize;

use crate::schemas::submission::{Grade, Room};

/// Body of the `upload` action. `file_data` is standard base64.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub name: String,
    pub student_number: String,
    pub grade: Grade,
    pub room: Room,
    pub file_data: String,
    pub file_name: String,
    pub mime_type: String,
}
