//! Mapping of HTTP failures onto [`StoreError`].

use neetprep_core::error::StoreError;
use serde::Deserialize;

/// Seconds before a database request is abandoned.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error body returned by the Realtime Database REST API.
#[derive(Deserialize)]
struct RestError {
    error: String,
}

/// Classify a failed send: timeouts and connection errors both mean the
/// database could not be reached.
pub fn from_reqwest(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout(DEFAULT_TIMEOUT_SECS)
    } else {
        StoreError::Unavailable(e.to_string())
    }
}

/// Classify an error response. `404` is not an error for reads and is
/// handled by the caller.
pub fn from_status(status: u16, body: String) -> StoreError {
    let message = serde_json::from_str::<RestError>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    match status {
        401 | 403 => StoreError::PermissionDenied(message),
        503 => StoreError::Unavailable(message),
        _ => StoreError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_permission_denied() {
        let err = from_status(401, r#"{"error": "Permission denied"}"#.into());
        assert!(matches!(err, StoreError::PermissionDenied(ref m) if m == "Permission denied"));
        assert!(matches!(from_status(403, String::new()), StoreError::PermissionDenied(_)));
    }

    #[test]
    fn service_unavailable_is_unavailable() {
        assert!(from_status(503, "maintenance".into()).is_unavailable());
    }

    #[test]
    fn other_statuses_keep_the_raw_body() {
        match from_status(500, "boom".into()) {
            StoreError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
