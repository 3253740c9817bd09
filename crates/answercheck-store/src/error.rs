//! Mapping HTTP failures onto [`StoreError`].

pub use answercheck_core::error::StoreError;

/// Seconds to wait when a 429 response carries no usable `retry-after`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Classify a failed `send()`.
pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout(timeout_secs)
    } else if err.is_decode() {
        StoreError::Decode(err.to_string())
    } else {
        StoreError::NetworkError(err.to_string())
    }
}

/// Classify an error status returned by the store.
pub(crate) fn from_status(
    status: u16,
    retry_after: Option<&str>,
    body: String,
    table: &str,
) -> StoreError {
    match status {
        401 | 403 => StoreError::AuthenticationFailed(body),
        404 => StoreError::TableNotFound(table.to_string()),
        429 => StoreError::RateLimited {
            retry_after_ms: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                * 1000,
        },
        _ => StoreError::ApiError {
            status,
            message: extract_message(&body).unwrap_or(body),
        },
    }
}

/// PostgREST error bodies look like `{"code": "...", "message": "..."}`.
fn extract_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct PostgrestError {
        message: String,
    }

    serde_json::from_str::<PostgrestError>(body)
        .ok()
        .map(|e| e.message)
}
