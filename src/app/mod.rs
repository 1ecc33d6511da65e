//! Application model plus the orchestrator that feeds it from the flows.

pub mod model;

use thiserror::Error;
use tokio::sync::watch;

use crate::core::state::AppState;
use crate::flows::errors::FlowError;
use crate::flows::grading::LoginError;
use crate::flows::lookup::{LookupQuery, ReviewArrival};
use crate::flows::upload::{SubmissionDraft, UploadError};
use crate::schemas::auth::TeacherSession;
use crate::schemas::rubric::RubricScores;
use crate::schemas::submission::SubmissionRecord;
use crate::tasks::result_poll::{watch_until_graded, PollOutcome};
use crate::views::dashboard::DashboardStats;
use crate::views::gallery::GalleryFilter;

pub use model::{AppModel, AppStatus, Event, View};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("teacher login required")]
    NotLoggedIn,
    #[error("row {0} is not in the submission list")]
    UnknownRow(i64),
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Flow(#[from] FlowError),
}

/// Runs flows against shared state and folds their results into an
/// [`AppModel`] one event at a time.
pub struct App {
    state: AppState,
    model: AppModel,
}

impl App {
    pub fn new(state: AppState) -> Self {
        Self { state, model: AppModel::default() }
    }

    pub fn model(&self) -> &AppModel {
        &self.model
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn dispatch(&mut self, event: Event) {
        let arrival = self.model.apply(event);
        tracing::trace!(view = self.model.view.name(), status = ?self.model.status, "Event applied");
        if let Some(arrival) = arrival {
            self.announce(&arrival);
        }
    }

    fn announce(&self, arrival: &ReviewArrival) {
        self.state.notifier().notify(arrival.title(), &arrival.body());
    }

    fn sync_submissions(&mut self) {
        let records = self.state.store().records();
        self.dispatch(Event::SubmissionsLoaded(records));
    }

    pub fn navigate(&mut self, view: View) {
        self.dispatch(Event::Navigate(view));
    }

    /// Loads the submission list. On failure the previous list stays.
    pub async fn refresh(&mut self, silent: bool) -> Result<usize, AppError> {
        if !silent {
            self.dispatch(Event::LoadStarted);
        }
        let result = self.state.store().refresh(silent).await;
        if result.is_ok() {
            self.sync_submissions();
        }
        if !silent {
            self.dispatch(Event::LoadFinished);
        }
        Ok(result?)
    }

    pub async fn load_rubric(&mut self) -> Result<usize, AppError> {
        let criteria = self.state.grading().load_rubric().await?;
        let count = criteria.len();
        self.dispatch(Event::RubricLoaded(criteria));
        Ok(count)
    }

    pub async fn submit(&mut self, draft: SubmissionDraft) -> Result<(), AppError> {
        let name = draft.name.trim().to_string();
        let result = self.state.upload().submit(draft).await;

        if !matches!(result, Err(UploadError::MissingFields(_)) | Err(UploadError::Busy)) {
            self.dispatch(Event::UploadStarted { name });
            self.dispatch(Event::UploadStatusChanged(self.state.upload().status()));
        }
        if result.is_ok() {
            self.sync_submissions();
        }
        Ok(result?)
    }

    pub fn reset(&mut self) {
        self.state.upload().reset();
        self.dispatch(Event::UploadStatusChanged(self.state.upload().status()));
    }

    pub async fn login(&mut self, username: &str, pin: &str) -> Result<TeacherSession, AppError> {
        match self.state.grading().login(username, pin).await {
            Ok(session) => {
                self.dispatch(Event::LoggedIn(session.clone()));
                if let Err(err) = self.load_rubric().await {
                    tracing::warn!(error = %err, "Rubric load after login failed");
                }
                Ok(session)
            }
            Err(err) => {
                self.dispatch(Event::LoginFailed);
                Err(err.into())
            }
        }
    }

    pub fn logout(&mut self) {
        self.dispatch(Event::LoggedOut);
    }

    /// Grades one row on behalf of the logged-in teacher. `Ok(false)` means the
    /// gateway did not accept it.
    pub async fn grade(
        &mut self,
        row_id: i64,
        scores: RubricScores,
        comment: &str,
    ) -> Result<bool, AppError> {
        if self.model.teacher.is_none() {
            return Err(AppError::NotLoggedIn);
        }
        let accepted = self.state.grading().grade(row_id, scores, comment).await;
        if accepted {
            self.sync_submissions();
        }
        Ok(accepted)
    }

    /// Praise text for a row, based on the scores being entered.
    pub async fn ai_comment(&self, row_id: i64, scores: &RubricScores) -> Result<String, AppError> {
        let name = self
            .model
            .submissions
            .iter()
            .find(|record| record.row_id == Some(row_id))
            .map(|record| record.name.clone())
            .ok_or(AppError::UnknownRow(row_id))?;
        Ok(self.state.ai().generate(&name, scores.total()).await)
    }

    /// Shows the result screen for `query` and searches the cached list.
    pub fn lookup(&mut self, query: LookupQuery) -> Option<&SubmissionRecord> {
        self.dispatch(Event::LookupChanged(query));
        self.dispatch(Event::LookupSearched);
        self.model.lookup().and_then(|lookup| lookup.matched())
    }

    /// Polls until the looked-up record is graded, it disappears, or
    /// `shutdown` fires.
    pub async fn watch_result(&mut self, shutdown: watch::Receiver<bool>) -> PollOutcome {
        let Some(mut lookup) = self.model.lookup().cloned() else {
            return PollOutcome::NotNeeded;
        };
        let period = self.state.settings().poll_interval();
        let outcome = watch_until_graded(
            self.state.store(),
            &mut lookup,
            self.state.notifier().as_ref(),
            period,
            shutdown,
        )
        .await;

        self.dispatch(Event::LookupWatched(lookup));
        self.sync_submissions();
        outcome
    }

    pub fn gallery(&mut self, filter: GalleryFilter) -> Vec<SubmissionRecord> {
        let visible = filter.apply(&self.model.submissions).into_iter().cloned().collect();
        self.dispatch(Event::Navigate(View::Gallery(filter)));
        visible
    }

    pub fn dashboard(&mut self) -> DashboardStats {
        self.dispatch(Event::Navigate(View::Dashboard));
        DashboardStats::from_records(&self.model.submissions)
    }
}
