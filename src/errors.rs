// src/errors.rs
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ResponseStatus;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Error decoding request body: {0}")]
    BadRequest(String),

    #[error("Source not confirmed")]
    Unauthorized,

    /// Same condition as `Unauthorized`, reported by the data routes with 406.
    #[error("Source not confirmed")]
    NotConfirmed,

    #[error("Cannot create build directory: {0}")]
    WorkspaceCreateFailed(#[source] std::io::Error),

    #[error("Cannot write contents to file for compile: {0}")]
    WorkspaceWriteFailed(#[source] std::io::Error),

    #[error("Running compiler failed: {0}")]
    ProcessError(String),

    #[error("Compiler did not finish within {0:?}")]
    CompileTimeout(std::time::Duration),

    #[error("Result file does not exist")]
    ResultMissing,

    #[error("Reading result file failed: {0}")]
    ResultUnreadable(#[source] std::io::Error),

    #[error("Parsing result file failed: {0}")]
    ResultMalformed(#[source] serde_json::Error),

    #[error("No release found with ID")]
    ReleaseNotFound,

    #[error("Platform not found")]
    PlatformNotFound,

    #[error("No commits found")]
    NoCommits,

    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Unexpected response structure: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::NotConfirmed => StatusCode::NOT_ACCEPTABLE,
            ServerError::ResultMissing
            | ServerError::ReleaseNotFound
            | ServerError::PlatformNotFound
            | ServerError::NoCommits => StatusCode::NOT_FOUND,
            ServerError::CompileTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ResponseStatus::new(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_errors_map_to_client_statuses() {
        assert_eq!(ServerError::BadRequest("eof".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServerError::NotConfirmed.status_code(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(ServerError::Unauthorized.to_string(), "Source not confirmed");
    }

    #[test]
    fn test_compile_errors_map_to_server_statuses() {
        assert_eq!(ServerError::ResultMissing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServerError::ProcessError("exit status: 1".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            ServerError::WorkspaceCreateFailed(io).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ServerError::CompileTimeout(std::time::Duration::from_secs(30)).status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
