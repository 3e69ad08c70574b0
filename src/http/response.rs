//! Response validation

use crate::error::{ActionError, Result};
use reqwest::{Response, StatusCode};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Upper bound on body bytes read for diagnostics, enough for one char past the snippet
const MAX_BODY_READ_BYTES: usize = (MAX_LOG_BODY_LENGTH + 1) * 4;

/// Sanitize response body for logging and error messages
/// Truncates long responses and drops control characters
pub fn sanitize_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    let truncated = if char_count > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated]", head)
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Read the response and fail unless the status is 2xx
pub async fn validate(mut response: Response) -> Result<StatusCode> {
    let status = response.status();
    // The body only matters for diagnostics, a read failure is not fatal
    let body = match read_body_prefix(&mut response).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Failed to read response body: {}", e);
            String::new()
        }
    };

    classify(status, &body)
}

/// Read at most `MAX_BODY_READ_BYTES` of the body, leaving the rest unread
async fn read_body_prefix(response: &mut Response) -> reqwest::Result<String> {
    let mut buf = Vec::new();
    while buf.len() < MAX_BODY_READ_BYTES {
        match response.chunk().await? {
            Some(chunk) => buf.extend_from_slice(&chunk),
            None => break,
        }
    }
    buf.truncate(MAX_BODY_READ_BYTES);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Classify a status code, carrying a body snippet on failure
pub fn classify(status: StatusCode, body: &str) -> Result<StatusCode> {
    tracing::info!("HTTP response status: {}", status);
    tracing::debug!("HTTP response body: {}", sanitize_for_log(body));

    if status.is_success() {
        return Ok(status);
    }

    tracing::error!("HTTP error: {} - {}", status, sanitize_for_log(body));
    Err(ActionError::HttpStatus {
        status,
        body: sanitize_for_log(body),
    })
}
