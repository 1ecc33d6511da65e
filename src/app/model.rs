use std::sync::Arc;

use crate::flows::lookup::{LookupQuery, ResultLookup, ReviewArrival};
use crate::flows::upload::UploadStatus;
use crate::schemas::auth::TeacherSession;
use crate::schemas::rubric::RubricCriterion;
use crate::schemas::submission::SubmissionRecord;
use crate::views::gallery::GalleryFilter;

/// Which screen is showing, with the state that belongs only to that screen.
#[derive(Debug, Clone, Default)]
pub enum View {
    #[default]
    Student,
    Result(ResultLookup),
    Gallery(GalleryFilter),
    TeacherLogin { failed: bool },
    Teacher,
    Dashboard,
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Result(_) => "result",
            Self::Gallery(_) => "gallery",
            Self::TeacherLogin { .. } => "teacher-login",
            Self::Teacher => "teacher",
            Self::Dashboard => "dashboard",
        }
    }
}

/// Global status flag shared by uploads and loud refreshes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppStatus {
    #[default]
    Idle,
    Uploading,
    Success,
    Error,
    LoadingData,
}

#[derive(Debug, Clone)]
pub enum Event {
    Navigate(View),
    LoadStarted,
    LoadFinished,
    SubmissionsLoaded(Arc<Vec<SubmissionRecord>>),
    UploadStarted { name: String },
    UploadStatusChanged(UploadStatus),
    LoggedIn(TeacherSession),
    LoginFailed,
    LoggedOut,
    RubricLoaded(Vec<RubricCriterion>),
    LookupChanged(LookupQuery),
    LookupSearched,
    /// Hands back a lookup that was advanced off-screen by the result poll.
    LookupWatched(ResultLookup),
}

/// Everything the screens render from. Only `apply` mutates it.
#[derive(Debug, Clone, Default)]
pub struct AppModel {
    pub view: View,
    pub status: AppStatus,
    pub error_message: Option<String>,
    pub last_submission_name: Option<String>,
    pub submissions: Arc<Vec<SubmissionRecord>>,
    pub teacher: Option<TeacherSession>,
    pub rubric: Vec<RubricCriterion>,
}

impl AppModel {
    /// Applies one event. Returns a review that arrived for the record the
    /// result screen is showing, if this event revealed one.
    pub fn apply(&mut self, event: Event) -> Option<ReviewArrival> {
        match event {
            Event::Navigate(View::Teacher) if self.teacher.is_none() => {
                self.view = View::TeacherLogin { failed: false };
            }
            Event::Navigate(View::TeacherLogin { .. }) if self.teacher.is_some() => {
                self.view = View::Teacher;
            }
            Event::Navigate(view) => self.view = view,
            Event::LoadStarted => {
                if self.status == AppStatus::Idle {
                    self.status = AppStatus::LoadingData;
                }
            }
            Event::LoadFinished => {
                if self.status == AppStatus::LoadingData {
                    self.status = AppStatus::Idle;
                }
            }
            Event::SubmissionsLoaded(records) => {
                self.submissions = records;
                if let View::Result(lookup) = &mut self.view {
                    return lookup.observe(&self.submissions);
                }
            }
            Event::UploadStarted { name } => {
                self.last_submission_name = Some(name);
                self.error_message = None;
                self.status = AppStatus::Uploading;
            }
            Event::UploadStatusChanged(status) => match status {
                UploadStatus::Idle => {
                    self.status = AppStatus::Idle;
                    self.error_message = None;
                }
                UploadStatus::Uploading => self.status = AppStatus::Uploading,
                UploadStatus::Success => self.status = AppStatus::Success,
                UploadStatus::Error(message) => {
                    self.status = AppStatus::Error;
                    self.error_message = Some(message);
                }
            },
            Event::LoggedIn(session) => {
                self.teacher = Some(session);
                self.view = View::Teacher;
            }
            Event::LoginFailed => {
                self.teacher = None;
                self.view = View::TeacherLogin { failed: true };
            }
            Event::LoggedOut => {
                self.teacher = None;
                if matches!(self.view, View::Teacher) {
                    self.view = View::Student;
                }
            }
            Event::RubricLoaded(criteria) => self.rubric = criteria,
            Event::LookupChanged(query) => match &mut self.view {
                View::Result(lookup) => lookup.set_query(query),
                _ => self.view = View::Result(ResultLookup::new(query)),
            },
            Event::LookupSearched => {
                if let View::Result(lookup) = &mut self.view {
                    lookup.search(&self.submissions);
                }
            }
            Event::LookupWatched(lookup) => self.view = View::Result(lookup),
        }
        None
    }

    pub fn lookup(&self) -> Option<&ResultLookup> {
        match &self.view {
            View::Result(lookup) => Some(lookup),
            _ => None,
        }
    }
}
