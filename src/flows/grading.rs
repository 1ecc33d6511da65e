use serde_json::json;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::core::time::now_rfc3339;
use crate::flows::errors::{require_success, FlowError};
use crate::schemas::auth::{LoginRequest, TeacherSession};
use crate::schemas::gateway::Action;
use crate::schemas::rubric::{decode_criteria, GradeRequest, RubricCriterion, RubricScores};
use crate::services::gateway::SharedGateway;
use crate::store::SubmissionStore;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("username and PIN are required")]
    MissingCredentials,
    #[error("login rejected: {}", .0.as_deref().unwrap_or("wrong username or PIN"))]
    Rejected(Option<String>),
    #[error(transparent)]
    Transport(#[from] crate::services::gateway::TransportError),
}

#[derive(Debug, Error)]
pub enum GradeError {
    #[error("invalid rubric scores: {0}")]
    InvalidScores(#[from] ValidationErrors),
    #[error(transparent)]
    Failed(#[from] FlowError),
}

/// Teacher-side mutations: login, rubric criteria, grading.
#[derive(Clone)]
pub struct GradingFlow {
    gateway: SharedGateway,
    store: SubmissionStore,
}

impl GradingFlow {
    pub fn new(gateway: SharedGateway, store: SubmissionStore) -> Self {
        Self { gateway, store }
    }

    pub async fn login(&self, username: &str, pin: &str) -> Result<TeacherSession, LoginError> {
        let username = username.trim();
        let pin = pin.trim();
        if username.is_empty() || pin.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let request = LoginRequest { username: username.to_string(), pin: pin.to_string() };
        let reply = self.gateway.call(Action::Login, json!(request)).await?;
        if !reply.success {
            tracing::info!(username, "Teacher login rejected");
            return Err(LoginError::Rejected(reply.server_message().map(str::to_string)));
        }

        let teacher_name = reply
            .teacher_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| username.to_string());
        tracing::info!(username, teacher_name = %teacher_name, "Teacher logged in");

        Ok(TeacherSession { username: username.to_string(), teacher_name })
    }

    pub async fn load_rubric(&self) -> Result<Vec<RubricCriterion>, FlowError> {
        let reply = require_success(self.gateway.call(Action::GetRubric, json!({})).await)?;
        Ok(decode_criteria(reply.data))
    }

    /// Records a review for `row_id`. True means the gateway accepted it and a
    /// silent refresh has been issued; the refreshed cache carries the totals
    /// the gateway persisted.
    pub async fn grade(&self, row_id: i64, scores: RubricScores, comment: &str) -> bool {
        match self.try_grade(row_id, scores, comment).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(row_id, error = %err, "Grading failed");
                false
            }
        }
    }

    pub async fn try_grade(
        &self,
        row_id: i64,
        scores: RubricScores,
        comment: &str,
    ) -> Result<(), GradeError> {
        scores.validate()?;

        let request = GradeRequest::new(row_id, scores, comment.trim().to_string(), now_rfc3339());
        require_success(self.gateway.call(Action::Grade, json!(request)).await)?;
        tracing::info!(row_id, total_score = request.total_score, "Submission graded");

        if let Err(err) = self.store.refresh(true).await {
            tracing::warn!(row_id, error = %err, "Refresh after grading failed");
        }
        Ok(())
    }
}
