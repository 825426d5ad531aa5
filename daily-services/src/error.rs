//! Error type shared by the service clients.
//!
//! Client calls return `ServiceResult`; orchestration code lifts these into
//! `anyhow::Error` with context, the way the config loaders do.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from an external API
    #[error("{service} API error {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Token acquisition failed or returned no token
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("JWT signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Response parsed but lacked the expected content
    #[error("Unexpected {service} response: {message}")]
    Unexpected {
        service: &'static str,
        message: String,
    },
}

impl ServiceError {
    /// Read the body of a failed response into a `Status` error.
    pub async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ServiceError::Status {
            service,
            status,
            body: body.chars().take(300).collect(),
        }
    }

    /// Transport failures, error statuses and failed token exchanges are
    /// worth another attempt; malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ServiceError::Http(_) | ServiceError::Status { .. } | ServiceError::Auth(_)
        )
    }

    pub fn unexpected(service: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Unexpected {
            service,
            message: message.into(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
