//! Validation utilities for Web API DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::validation;
use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// This extractor deserializes the request body as JSON and then validates it
/// using the `validator` crate. If validation fails, it returns a detailed
/// error response with field-level error information.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

fn to_validator_error(
    code: &'static str,
    err: validation::ValidationError,
) -> validator::ValidationError {
    validator::ValidationError::new(code).with_message(err.to_string().into())
}

/// Email address shape and length.
pub fn valid_email(value: &str) -> Result<(), validator::ValidationError> {
    validation::validate_email(value.trim()).map_err(|e| to_validator_error("email", e))
}

/// Username characters and length.
pub fn valid_username(value: &str) -> Result<(), validator::ValidationError> {
    validation::validate_username(value).map_err(|e| to_validator_error("username", e))
}

/// Password length.
pub fn valid_password(value: &str) -> Result<(), validator::ValidationError> {
    validation::validate_password(value).map_err(|e| to_validator_error("password", e))
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    Ok(())
}
