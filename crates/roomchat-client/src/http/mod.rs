//! Third-party HTTP integrations: push relay and background image search

mod images;
mod push;

pub use images::{fallback_backgrounds, BackgroundImage, ImageSearchClient};
pub use push::{PushClient, PushMessage};

/// Error type for outbound HTTP calls
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Remote service error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Read the body, turning non-2xx responses into [`HttpError::Status`]
async fn checked_body(resp: reqwest::Response) -> Result<String, HttpError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(HttpError::Status {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(body)
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client, HttpError> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}
