use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::flows::errors::{require_success, FlowError, SYSTEM_UNAVAILABLE};
use crate::schemas::gateway::Action;
use crate::schemas::submission::{Grade, Room};
use crate::schemas::upload::UploadRequest;
use crate::services::gateway::SharedGateway;
use crate::services::media::VideoFile;
use crate::services::notifier::Notifier;
use crate::store::SubmissionStore;

pub const UPLOAD_FAILED: &str = "Upload failed. Please try again.";
pub const VIDEO_UNREADABLE: &str = "Could not read the video file. Please choose it again.";

/// The student's form before it is sent.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub name: String,
    pub student_number: String,
    pub grade: Grade,
    pub room: Room,
    pub video: Option<VideoFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Success,
    Error(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("an upload is already in progress or awaiting reset")]
    Busy,
    #[error("video is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("failed to read video: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to encode upload request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Failed(#[from] FlowError),
}

#[derive(Clone)]
pub struct UploadFlow {
    gateway: SharedGateway,
    store: SubmissionStore,
    notifier: Arc<dyn Notifier>,
    max_upload_bytes: u64,
    status: Arc<watch::Sender<UploadStatus>>,
}

impl UploadFlow {
    pub fn new(
        gateway: SharedGateway,
        store: SubmissionStore,
        notifier: Arc<dyn Notifier>,
        max_upload_bytes: u64,
    ) -> Self {
        let (status, _) = watch::channel(UploadStatus::Idle);
        Self { gateway, store, notifier, max_upload_bytes, status: Arc::new(status) }
    }

    pub fn status(&self) -> UploadStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<UploadStatus> {
        self.status.subscribe()
    }

    /// Success or Error back to Idle. Does nothing while an upload is running.
    pub fn reset(&self) {
        self.status.send_if_modified(|status| match status {
            UploadStatus::Success | UploadStatus::Error(_) => {
                *status = UploadStatus::Idle;
                true
            }
            UploadStatus::Idle | UploadStatus::Uploading => false,
        });
    }

    /// Sends one submission. Incomplete drafts are rejected before any I/O and
    /// leave the status untouched; everything after that ends in Success or
    /// Error. Never retried.
    pub async fn submit(&self, draft: SubmissionDraft) -> Result<(), UploadError> {
        let missing = missing_fields(&draft);
        if !missing.is_empty() {
            return Err(UploadError::MissingFields(missing));
        }
        let Some(video) = draft.video.as_ref() else {
            return Err(UploadError::MissingFields(vec!["video"]));
        };

        let claimed = self.status.send_if_modified(|status| {
            if *status == UploadStatus::Idle {
                *status = UploadStatus::Uploading;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(UploadError::Busy);
        }

        tracing::info!(
            student = %draft.name,
            grade = %draft.grade,
            room = %draft.room,
            file_name = %video.file_name,
            "Uploading submission"
        );

        match self.send(&draft, video).await {
            Ok(()) => {
                self.status.send_replace(UploadStatus::Success);
                self.notifier.celebrate(&draft.name);
                if let Err(err) = self.store.refresh(true).await {
                    tracing::warn!(error = %err, "Refresh after upload failed");
                }
                Ok(())
            }
            Err(err) => {
                let message = match &err {
                    UploadError::Failed(flow) => flow.user_message(UPLOAD_FAILED),
                    UploadError::TooLarge { limit, .. } => format!(
                        "The video is too large. Please choose a file under {} MB.",
                        limit / (1024 * 1024)
                    ),
                    UploadError::Read(_) => VIDEO_UNREADABLE.to_string(),
                    _ => SYSTEM_UNAVAILABLE.to_string(),
                };
                tracing::warn!(error = %err, student = %draft.name, "Upload failed");
                self.status.send_replace(UploadStatus::Error(message));
                Err(err)
            }
        }
    }

    async fn send(&self, draft: &SubmissionDraft, video: &VideoFile) -> Result<(), UploadError> {
        let size = video.size().await?;
        if size > self.max_upload_bytes {
            return Err(UploadError::TooLarge { size, limit: self.max_upload_bytes });
        }

        let request = UploadRequest {
            name: draft.name.trim().to_string(),
            student_number: draft.student_number.trim().to_string(),
            grade: draft.grade,
            room: draft.room,
            file_data: video.encode_base64().await?,
            file_name: video.file_name.clone(),
            mime_type: video.mime_type.clone(),
        };
        let data = serde_json::to_value(&request)?;

        require_success(self.gateway.call(Action::Upload, data).await)?;
        Ok(())
    }
}

fn missing_fields(draft: &SubmissionDraft) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if draft.name.trim().is_empty() {
        missing.push("name");
    }
    if draft.student_number.trim().is_empty() {
        missing.push("studentNumber");
    }
    if draft.video.is_none() {
        missing.push("video");
    }
    missing
}
