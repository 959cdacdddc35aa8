//! Orchestrator error taxonomy.
//!
//! Errors never cross a context boundary as faults: they are turned into a
//! [`CommandResult`] for the requester and, for capture/crop failures, a
//! `SELECTION_FAILED` broadcast.

use crate::capture::CropError;
use crate::protocol::CommandResult;

#[derive(Debug, thiserror::Error)]
pub enum SnipError {
    /// The target page is one where the browser forbids injection.
    #[error("This page does not allow script injection")]
    PolicyRejection { url: String, reason: &'static str },

    #[error("No active tab")]
    NoActiveTab,

    #[error("Injection failed: {0}")]
    InjectionFailure(String),

    #[error("Capture/crop failed: {0}")]
    CaptureFailure(String),

    #[error("Capture/crop failed: {0}")]
    CropFailure(#[from] CropError),
}

impl SnipError {
    /// Capture and crop failures are announced to every panel, not only
    /// the requester.
    pub fn is_broadcast(&self) -> bool {
        matches!(
            self,
            SnipError::CaptureFailure(_) | SnipError::CropFailure(_)
        )
    }
}

impl From<SnipError> for CommandResult {
    fn from(error: SnipError) -> Self {
        CommandResult::failure(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_panel_copy() {
        let policy = SnipError::PolicyRejection {
            url: "chrome://settings".into(),
            reason: "Browser internal page",
        };
        assert_eq!(policy.to_string(), "This page does not allow script injection");
        assert_eq!(SnipError::NoActiveTab.to_string(), "No active tab");
        assert_eq!(
            SnipError::InjectionFailure("Frame was removed".into()).to_string(),
            "Injection failed: Frame was removed"
        );
        assert_eq!(
            SnipError::from(CropError::MalformedDataUrl).to_string(),
            "Capture/crop failed: Capture is not a base64 data URL"
        );
    }

    #[test]
    fn only_pixel_failures_are_broadcast() {
        assert!(SnipError::CaptureFailure("tab hidden".into()).is_broadcast());
        assert!(SnipError::from(CropError::EncodingFailed("x".into())).is_broadcast());
        assert!(!SnipError::NoActiveTab.is_broadcast());
        assert!(!SnipError::InjectionFailure("x".into()).is_broadcast());
    }

    #[test]
    fn converts_into_failure_result() {
        let result: CommandResult = SnipError::NoActiveTab.into();
        assert_eq!(result, CommandResult::failure("No active tab"));
    }
}
