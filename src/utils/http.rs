// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;

const USER_AGENT: &str = concat!("wordfeed/", env!("CARGO_PKG_VERSION"));

/// Create an asynchronous HTTP client with the crate's user agent and a
/// per-request timeout.
pub fn create_async_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Read a response body for an error message, capped to keep logs readable.
pub async fn error_body(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    match text.char_indices().nth(500) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_for_any_timeout() {
        assert!(create_async_client(1).is_ok());
        assert!(create_async_client(60).is_ok());
    }
}
