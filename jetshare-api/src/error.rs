use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jetshare_core::RepositoryError;
use serde_json::{json, Value};
use validator::ValidationErrors;

/// Every handler failure, rendered as `{ "error": .., "details"?: .. }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Unauthorized".to_string())
    }

    /// For `map_err` on adapter calls: `.map_err(AppError::upstream("Failed to fetch jets"))`.
    pub fn upstream(context: &'static str) -> impl Fn(RepositoryError) -> AppError {
        move |source| AppError::Upstream { context, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::Validation { message, details } => (StatusCode::BAD_REQUEST, message, details),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::Upstream {
                source: RepositoryError::MissingUser,
                ..
            } => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            AppError::Upstream { context, source } => {
                tracing::error!("{}: {}", context, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    context.to_string(),
                    Some(Value::String(source.to_string())),
                )
            }
        };

        let body = match details {
            Some(details) => json!({ "error": error_message, "details": details }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation {
            message: describe(&errors),
            details: serde_json::to_value(&errors).ok(),
        }
    }
}

/// One `field: message` clause per failing field, sorted by field name.
fn describe(errors: &ValidationErrors) -> String {
    let mut clauses: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed `{}` check", e.code));
                (field.clone(), message)
            })
        })
        .collect();
    clauses.sort();

    clauses
        .into_iter()
        .map(|(field, message)| {
            if field == "__all__" {
                message
            } else {
                format!("{}: {}", field, message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
