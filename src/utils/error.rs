use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Errors surfaced by the account/workout API.
///
/// The `Display` text of the client-facing variants is exactly what the
/// mobile app shows, so keep those messages stable.
#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    NotFound(String),
    InvalidRequest(String),
    Unauthorized(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::InvalidRequest(msg) => write!(f, "{}", msg),
            AppError::Unauthorized(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::DatabaseError(msg) => HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error",
                "error": msg
            })),
            _ => HttpResponse::build(self.status_code()).json(serde_json::json!({
                "message": self.to_string()
            })),
        }
    }
}

/// Errors raised by the training client when talking to its collaborators.
#[derive(Debug)]
pub enum ClientError {
    /// Transport failure (connection refused, timeout, bad body).
    Http(String),
    /// The remote answered with a non-success status.
    Api { status: u16, message: String },
    /// Frame capture failed.
    Capture(String),
    /// Text-to-speech failed.
    Speech(String),
    InvalidInput(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(msg) => write!(f, "{}", msg),
            ClientError::Api { status, message } => {
                if message.is_empty() {
                    write!(f, "Server error: {}", status)
                } else {
                    write!(f, "Server error: {} ({})", status, message)
                }
            }
            ClientError::Capture(msg) => write!(f, "Capture failed: {}", msg),
            ClientError::Speech(msg) => write!(f, "Speech failed: {}", msg),
            ClientError::InvalidInput(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Capture(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("User not found".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::DatabaseError("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_facing_messages_are_verbatim() {
        assert_eq!(
            AppError::InvalidRequest("All fields are required".into()).to_string(),
            "All fields are required"
        );
        assert_eq!(
            ClientError::Api { status: 503, message: String::new() }.to_string(),
            "Server error: 503"
        );
    }
}
