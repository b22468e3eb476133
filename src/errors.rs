// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing required fields: {0}")]
    MissingFields(String),

    #[error("Upstream error: {message}")]
    UpstreamError {
        message: String,
        status: Option<u16>,
        body: Option<Value>,
    },

    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl AppError {
    /// Short label returned in the `error` field of the response body.
    fn label(&self) -> &'static str {
        match self {
            AppError::ConfigurationError(_) => "ClickPesa credentials not configured",
            AppError::ValidationError(_) => "Invalid payment request",
            AppError::MissingFields(_) => "Missing required fields: amount, phoneNumber, or orderReference",
            AppError::UpstreamError { .. } => "ClickPesa request failed",
            AppError::PersistenceError(_) => "Store unavailable",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::MissingFields(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigurationError(_)
            | AppError::UpstreamError { .. }
            | AppError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> String {
        match self {
            AppError::ConfigurationError(msg)
            | AppError::ValidationError(msg)
            | AppError::MissingFields(msg)
            | AppError::PersistenceError(msg) => msg.clone(),
            AppError::UpstreamError { message, .. } => message.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut body = json!({
            "error": self.label(),
            "details": self.details(),
        });

        if let AppError::UpstreamError {
            status: upstream_status,
            body: upstream_body,
            ..
        } = &self
        {
            if let Some(code) = upstream_status {
                body["upstreamStatus"] = json!(code);
            }
            if let Some(payload) = upstream_body {
                body["upstream"] = payload.clone();
            }
        }

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::UpstreamError {
            message: format!("HTTP request failed: {}", err),
            status: err.status().map(|s| s.as_u16()),
            body: None,
        }
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let only_missing = err
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .all(|error| error.code == "required");

        if only_missing {
            AppError::MissingFields(err.to_string())
        } else {
            AppError::ValidationError(err.to_string())
        }
    }
}

// Helper conversion functions
impl AppError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        AppError::UpstreamError {
            message: msg.into(),
            status: None,
            body: None,
        }
    }

    pub fn upstream_response(msg: impl Into<String>, status: u16, body: Option<Value>) -> Self {
        AppError::UpstreamError {
            message: msg.into(),
            status: Some(status),
            body,
        }
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        AppError::PersistenceError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
