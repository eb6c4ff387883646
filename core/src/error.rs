//! Error types for the billing API client.
//!
//! # Design
//! Two families. `UsageError` means the caller invoked an operation on a
//! resource that lacks a required identifier; it is returned before any
//! request is issued and is never converted into an absent result.
//! `ApiError` covers everything the server or the wire can do wrong, and is
//! what the degrading operations log and swallow.
//!
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status."

use thiserror::Error;

/// A required identifier was missing on the resource an operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("the {0} must be set before calling this operation")]
    MissingField(&'static str),
}

/// Errors produced while talking to the billing API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The client configuration is invalid or could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The request never produced a response (connection, TLS, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// A creation response carried neither a `Location` header nor a body.
    #[error("creation response has no location and no body")]
    MissingLocation,

    /// The charge endpoint answered without any item to locate the invoice by.
    #[error("charge response contains no invoice item with an invoice id")]
    EmptyChargeResponse,

    #[error(transparent)]
    Usage(#[from] UsageError),
}
