pub mod auth;
pub mod gateway;
pub(crate) mod lenient;
pub mod rubric;
pub mod submission;
pub mod upload;

pub use auth::{LoginRequest, TeacherSession};
pub use gateway::{Action, GatewayReply};
pub use rubric::{RubricCriterion, RubricScores};
pub use submission::{Grade, ReviewStatus, Room, RubricReview, SubmissionRecord};
