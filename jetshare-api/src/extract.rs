use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use jetshare_core::jetshare::OfferStatus;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// JSON body that has been deserialized and passed its `Validate` rules.
/// Rejections happen before the handler runs, so no external call is made.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            AppError::Validation {
                message: "Invalid request body".to_string(),
                details: Some(Value::String(rejection.body_text())),
            }
        })?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query-string counterpart of [`ValidatedJson`].
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation {
                message: "Invalid query string".to_string(),
                details: Some(Value::String(rejection.body_text())),
            })?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

/// A validation error carrying a human-readable message.
pub fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// `deserialize_with` for ids sent as strings; a bad id is rejected with the
/// field path in the `details` of the 400.
pub fn uuid_field<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Uuid::parse_str(raw.trim())
        .map_err(|_| de::Error::custom(format!("must be a valid UUID, got `{}`", raw)))
}

pub fn validate_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<OfferStatus>()
        .map(|_| ())
        .map_err(|_| rule("status", "must be one of open, accepted, completed, cancelled"))
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(rule("blank", "must not be blank"))
    } else {
        Ok(())
    }
}
