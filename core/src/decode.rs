//! Envelope unwrapping for service responses.
//!
//! Every response body is `{ "success": bool, "data": <payload>, "message"?: string }`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::HttpResponse;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

/// Decode the `data` payload of a response.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;

    let envelope: Envelope<T> = serde_json::from_slice(&response.body)
        .map_err(|e| ApiError::Decode(e.to_string()))?;

    if !envelope.success {
        return Err(ApiError::Rejected {
            message: envelope
                .message
                .unwrap_or_else(|| "no message provided".to_string()),
        });
    }

    envelope.data.ok_or_else(|| {
        ApiError::Decode(match envelope.message {
            Some(message) => format!("envelope has no data (message: {message})"),
            None => "envelope has no data".to_string(),
        })
    })
}

/// Map a non-2xx response to `ServerStatus`, preferring the envelope message.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let body = serde_json::from_slice::<Envelope<serde_json::Value>>(&response.body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| response.body_text());
    Err(ApiError::ServerStatus {
        status: response.status,
        body,
    })
}
