//! Error handling.

use axum::{
    extract::rejection::JsonRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tokio::sync::AcquireError;
use tracing::{event, Level};

/// Plotline server error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum ReductionError {
    /// Insufficient memory to process request
    #[error("Insufficient memory to process request ({requested} > {total})")]
    InsufficientMemory { requested: usize, total: usize },

    /// Error deserialising request data
    #[error("request data is not valid")]
    RequestJsonRejection(#[from] JsonRejection),

    /// Error validating request data (single error)
    #[error("request data is not valid")]
    RequestValidationSingle(#[from] validator::ValidationError),

    /// Error validating request data (multiple errors)
    #[error("request data is not valid")]
    RequestValidation(#[from] validator::ValidationErrors),

    /// Invalid remote sample source URL
    #[error("invalid sample source URL")]
    InvalidSourceUrl(#[from] url::ParseError),

    /// Error building a request to a remote sample source
    #[error("failed to build remote sample request")]
    RemoteRequest(#[from] axum::http::Error),

    /// Error communicating with a remote sample source
    #[error("error fetching from remote sample source")]
    RemoteFetch(#[from] hyper::Error),

    /// Error decoding a remote sample response
    #[error("failed to decode remote sample response")]
    RemoteDecode(#[from] serde_json::Error),

    /// Remote sample source returned a failure status
    #[error("remote sample source returned HTTP status {status}")]
    RemoteStatus { status: StatusCode },

    /// Error acquiring a semaphore
    #[error("error acquiring resources")]
    SemaphoreAcquireError(#[from] AcquireError),

    /// Error converting between integer types
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// Request for a series the store does not know
    #[error("unknown series {key}")]
    UnknownSeries { key: String },
}

impl IntoResponse for ReductionError {
    /// Convert from a `ReductionError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 502 bad gateway ErrorResponse
    fn bad_gateway<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_GATEWAY, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<ReductionError> for ErrorResponse {
    /// Convert from a `ReductionError` into an `ErrorResponse`.
    fn from(error: ReductionError) -> Self {
        let response = match &error {
            // Bad request
            ReductionError::InsufficientMemory {
                requested: _,
                total: _,
            }
            | ReductionError::InvalidSourceUrl(_)
            | ReductionError::RequestJsonRejection(_)
            | ReductionError::RequestValidationSingle(_)
            | ReductionError::RequestValidation(_) => Self::bad_request(&error),

            // Not found
            ReductionError::UnknownSeries { key: _ } => Self::not_found(&error),

            // Bad gateway: the remote sample source misbehaved.
            ReductionError::RemoteFetch(_)
            | ReductionError::RemoteDecode(_)
            | ReductionError::RemoteStatus { status: _ } => Self::bad_gateway(&error),

            // Internal server error
            ReductionError::RemoteRequest(_)
            | ReductionError::SemaphoreAcquireError(_)
            | ReductionError::TryFromInt(_) => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::HeaderMap;

    // Jump through the hoops to get the body as a string.
    async fn body_string(response: Response) -> String {
        String::from_utf8(
            hyper::body::to_bytes(response.into_body())
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap()
    }

    async fn test_reduction_error(
        error: ReductionError,
        status: StatusCode,
        message: &str,
        caused_by: Option<Vec<&'static str>>,
    ) {
        let response = error.into_response();
        assert_eq!(status, response.status());
        let mut headers = HeaderMap::new();
        headers.insert(&header::CONTENT_TYPE, "application/json".parse().unwrap());
        assert_eq!(headers, *response.headers());
        let error_response: ErrorResponse =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(message.to_string(), error_response.error.message);
        // Map Vec items from str to String
        let caused_by = caused_by.map(|cb| cb.iter().map(|s| s.to_string()).collect());
        assert_eq!(caused_by, error_response.error.caused_by);
    }

    #[tokio::test]
    async fn insufficient_memory() {
        let error = ReductionError::InsufficientMemory {
            requested: 2,
            total: 1,
        };
        let message = "Insufficient memory to process request (2 > 1)";
        let caused_by = None;
        test_reduction_error(error, StatusCode::BAD_REQUEST, message, caused_by).await;
    }

    #[tokio::test]
    async fn request_validation_single() {
        let validation_error = validator::ValidationError::new("foo");
        let error = ReductionError::RequestValidationSingle(validation_error);
        let message = "request data is not valid";
        let caused_by = Some(vec!["Validation error: foo [{}]"]);
        test_reduction_error(error, StatusCode::BAD_REQUEST, message, caused_by).await;
    }

    #[tokio::test]
    async fn request_validation() {
        let mut validation_errors = validator::ValidationErrors::new();
        let validation_error = validator::ValidationError::new("foo");
        validation_errors.add("bar", validation_error);
        let error = ReductionError::RequestValidation(validation_errors);
        let message = "request data is not valid";
        let caused_by = Some(vec!["bar: Validation error: foo [{}]"]);
        test_reduction_error(error, StatusCode::BAD_REQUEST, message, caused_by).await;
    }

    #[tokio::test]
    async fn unknown_series() {
        let error = ReductionError::UnknownSeries {
            key: "acme/vision/run-1/loss".to_string(),
        };
        let message = "unknown series acme/vision/run-1/loss";
        test_reduction_error(error, StatusCode::NOT_FOUND, message, None).await;
    }

    #[tokio::test]
    async fn remote_status() {
        let error = ReductionError::RemoteStatus {
            status: StatusCode::SERVICE_UNAVAILABLE,
        };
        let message = "remote sample source returned HTTP status 503 Service Unavailable";
        test_reduction_error(error, StatusCode::BAD_GATEWAY, message, None).await;
    }

    #[tokio::test]
    async fn remote_decode() {
        let json_error = serde_json::from_str::<u32>("{").unwrap_err();
        let error = ReductionError::RemoteDecode(json_error);
        let message = "failed to decode remote sample response";
        let caused_by = Some(vec!["EOF while parsing a value at line 1 column 1"]);
        test_reduction_error(error, StatusCode::BAD_GATEWAY, message, caused_by).await;
    }

    #[tokio::test]
    async fn semaphore_acquire_error() {
        let sem = tokio::sync::Semaphore::new(1);
        sem.close();
        let error = ReductionError::SemaphoreAcquireError(sem.acquire().await.unwrap_err());
        let message = "error acquiring resources";
        let caused_by = Some(vec!["semaphore closed"]);
        test_reduction_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }

    #[tokio::test]
    async fn try_from_int_error() {
        let error = ReductionError::TryFromInt(u8::try_from(-1_i8).unwrap_err());
        let message = "out of range integral type conversion attempted";
        let caused_by = None;
        test_reduction_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }
}
