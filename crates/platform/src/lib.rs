use types::PlatformErrorEnvelope;

mod http;

pub use http::HttpPlatformClient;

const MAX_ERROR_MESSAGE_LEN: usize = 512;

fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_owned()
}

/// Surface the first `errors[].message` of an error body, falling back to the
/// raw body and then to the status reason.
fn extract_http_error_message(body: &str, status_reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<PlatformErrorEnvelope>(body)
        && let Some(message) = parsed.first_message()
    {
        return truncate_message(message);
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return truncate_message(trimmed);
    }
    status_reason
        .map(str::to_owned)
        .unwrap_or_else(|| "empty error response from platform".to_owned())
}

fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return message.to_owned();
    }
    let prefix = message
        .chars()
        .take(MAX_ERROR_MESSAGE_LEN)
        .collect::<String>();
    format!("{prefix}...")
}
