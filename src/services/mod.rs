pub mod ai_feedback;
pub mod gateway;
pub mod media;
pub mod notifier;
