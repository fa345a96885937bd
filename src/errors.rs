// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photobooth

use crate::backends::camera::types::BackendError;
use crate::session::SessionState;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera / frame source errors
    Camera(BackendError),
    /// Session sequencing or composition errors
    Session(SessionError),
    /// Export errors
    Export(ExportError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Session-specific errors
#[derive(Debug, Clone)]
pub enum SessionError {
    /// A start was requested while the booth was not idle
    NotIdle(SessionState),
    /// Capturing a still failed; the session was abandoned
    CaptureFailed(String),
    /// More stills were pushed than a strip holds
    CollectionFull,
    /// Composition was requested with fewer than four stills
    IncompleteCollection(usize),
    /// A finished session was handed in while no session was running
    NotCapturing(SessionState),
    /// Rendering the strip failed
    ComposeFailed(String),
}

/// Export-specific errors
#[derive(Debug, Clone)]
pub enum ExportError {
    /// PNG encoding failed
    EncodingFailed(String),
    /// The delivery path could not hand the file to the user
    DeliveryFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Session(e) => write!(f, "Session error: {}", e),
            AppError::Export(e) => write!(f, "Export error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotIdle(state) => {
                write!(f, "Cannot start a session while {}", state)
            }
            SessionError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            SessionError::CollectionFull => write!(f, "Photo collection is already full"),
            SessionError::IncompleteCollection(count) => {
                write!(f, "Expected 4 photos, got {}", count)
            }
            SessionError::NotCapturing(state) => {
                write!(f, "No session is capturing (booth is {})", state)
            }
            SessionError::ComposeFailed(msg) => write!(f, "Composition failed: {}", msg),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            ExportError::DeliveryFailed(msg) => write!(f, "Delivery failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for SessionError {}
impl std::error::Error for ExportError {}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::DeliveryFailed(err.to_string())
    }
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        SessionError::CaptureFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_idle_mentions_state() {
        let err = SessionError::NotIdle(SessionState::Capturing);
        assert_eq!(err.to_string(), "Cannot start a session while capturing");
    }

    #[test]
    fn test_backend_error_becomes_capture_failure() {
        let err: SessionError = BackendError::NoFrame("warming up".into()).into();
        assert!(matches!(err, SessionError::CaptureFailed(_)));
    }

    #[test]
    fn test_app_error_wraps_export() {
        let err: AppError = ExportError::EncodingFailed("boom".into()).into();
        assert_eq!(err.to_string(), "Export error: Encoding failed: boom");
    }
}
