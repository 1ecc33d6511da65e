use thiserror::Error;

use crate::schemas::gateway::GatewayReply;
use crate::services::gateway::TransportError;

pub const SYSTEM_UNAVAILABLE: &str = "The system is unavailable. Please try again.";

/// The two ways a gateway round trip can fail.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("gateway rejected the request: {}", .message.as_deref().unwrap_or("no message"))]
    Business { message: Option<String> },
}

impl FlowError {
    /// Message to show a user; `fallback` covers a business failure without a
    /// server message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Business { message: Some(message) } => message.clone(),
            Self::Business { message: None } => fallback.to_string(),
            Self::Transport(_) => SYSTEM_UNAVAILABLE.to_string(),
        }
    }
}

pub(crate) fn require_success(
    result: Result<GatewayReply, TransportError>,
) -> Result<GatewayReply, FlowError> {
    let reply = result?;
    if reply.success {
        Ok(reply)
    } else {
        Err(FlowError::Business { message: reply.server_message().map(str::to_string) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_text() {
        let err = require_success(Ok(GatewayReply::failure("Drive quota exceeded"))).unwrap_err();
        assert_eq!(err.user_message("fallback"), "Drive quota exceeded");

        let err = require_success(Ok(GatewayReply::default())).unwrap_err();
        assert_eq!(err.user_message("fallback"), "fallback");

        let err = require_success(Err(TransportError::NotConfigured)).unwrap_err();
        assert_eq!(err.user_message("fallback"), SYSTEM_UNAVAILABLE);
    }

    #[test]
    fn success_passes_reply_through() {
        let reply = require_success(Ok(GatewayReply::ok(None))).expect("success");
        assert!(reply.success);
    }
}
