//! Decoding of response bodies into typed values.
//!
//! Every function here returns a typed `ApiError` and never logs. Recovery
//! belongs to the outermost public operation.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Map non-success status codes to the appropriate `ApiError` variant.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Decode one JSON object into `T`.
pub fn map_single<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    let value: serde_json::Value = decode(&response.body)?;
    if !value.is_object() {
        return Err(ApiError::DeserializationError(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Decode a JSON array into a `Vec<T>`, preserving element order.
pub fn map_many<T: DeserializeOwned>(response: &HttpResponse) -> Result<Vec<T>, ApiError> {
    check_status(response)?;
    decode(&response.body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
