//! Push notification relay client

use roomchat_common::PushConfig;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{build_client, checked_body, HttpError};

/// Payload accepted by the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    /// Device push token
    pub to: String,
    pub title: String,
    pub body: String,
    pub sound: String,
}

impl PushMessage {
    pub fn new(to: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            title: title.into(),
            body: body.into(),
            sound: "default".to_string(),
        }
    }
}

/// Posts notifications to a push relay endpoint
#[derive(Debug, Clone)]
pub struct PushClient {
    http: reqwest::Client,
    relay_url: String,
}

impl PushClient {
    pub fn new(relay_url: impl Into<String>, timeout_secs: u64) -> Result<Self, HttpError> {
        Ok(Self {
            http: build_client(timeout_secs)?,
            relay_url: relay_url.into(),
        })
    }

    pub fn from_config(config: &PushConfig) -> Result<Self, HttpError> {
        Self::new(config.relay_url.clone(), config.timeout_secs)
    }

    /// POST one notification; any non-2xx status is an error
    #[instrument(skip(self, message), fields(title = %message.title))]
    pub async fn send(&self, message: &PushMessage) -> Result<(), HttpError> {
        let resp = self
            .http
            .post(&self.relay_url)
            .json(message)
            .send()
            .await?;
        let body = checked_body(resp).await?;

        debug!(response = %body, "Push relayed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let message = PushMessage::new("ExponentPushToken[abc]", "kim", "hello");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "to": "ExponentPushToken[abc]",
                "title": "kim",
                "body": "hello",
                "sound": "default",
            })
        );
    }
}
