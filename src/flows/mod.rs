pub mod errors;
pub mod grading;
pub mod lookup;
pub mod upload;
