//! FCM HTTP v1 push sender.
//!
//! One request per token. A transport failure aborts the whole send; an
//! HTTP error is classified per token.

use musubi_core::push::{DeliveryOutcome, PushError, PushMessage, PushSender, TokenDelivery};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::FcmConfig;

#[derive(Clone)]
pub struct FcmPushSender {
    client: reqwest::Client,
    url: String,
    access_token: String,
}

impl FcmPushSender {
    pub fn new(config: &FcmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.send_url(),
            access_token: config.access_token.clone(),
        }
    }

    fn body(message: &PushMessage, token: &str) -> Value {
        let mut webpush = json!({
            "notification": {
                "title": message.title,
                "body": message.body,
            },
        });
        if let Some(link) = &message.link {
            webpush["fcm_options"] = json!({ "link": link });
        }
        json!({
            "message": {
                "token": token,
                "notification": { "title": message.title, "body": message.body },
                "data": message.data,
                "webpush": webpush,
            }
        })
    }
}

/// `errorCode` values FCM attaches under `error.details`.
fn error_codes(body: &str) -> Vec<String> {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };
    parsed["error"]["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .filter_map(|d| d["errorCode"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Classify a non-success FCM response for one token.
///
/// Only a 404 or an `UNREGISTERED` error code marks the token itself as
/// dead. `INVALID_ARGUMENT` covers malformed messages too and is treated
/// as transient.
fn classify(status: StatusCode, body: &str) -> DeliveryOutcome {
    if status == StatusCode::NOT_FOUND || error_codes(body).iter().any(|c| c == "UNREGISTERED") {
        return DeliveryOutcome::InvalidToken;
    }
    DeliveryOutcome::Failed(format!("{status}: {}", body.trim()))
}

impl PushSender for FcmPushSender {
    async fn send(&self, message: &PushMessage) -> Result<Vec<TokenDelivery>, PushError> {
        let mut deliveries = Vec::with_capacity(message.tokens.len());
        for token in &message.tokens {
            let response = self
                .client
                .post(&self.url)
                .bearer_auth(&self.access_token)
                .json(&Self::body(message, token))
                .send()
                .await
                .map_err(|e| PushError::Transport(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(PushError::Rejected(format!("FCM refused credentials: {status}")));
            }

            let outcome = if status.is_success() {
                DeliveryOutcome::Delivered
            } else {
                let text = response.text().await.unwrap_or_default();
                classify(status, &text)
            };
            debug!(%status, ?outcome, "FCM response");
            deliveries.push(TokenDelivery {
                token: token.clone(),
                outcome,
            });
        }
        Ok(deliveries)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn unregistered_tokens_are_invalid() {
        let body = r#"{"error":{"code":404,"status":"NOT_FOUND","details":[{"errorCode":"UNREGISTERED"}]}}"#;
        assert_eq!(
            classify(StatusCode::NOT_FOUND, body),
            DeliveryOutcome::InvalidToken
        );
        let body = r#"{"error":{"code":400,"details":[{"@type":"type.googleapis.com/google.firebase.fcm.v1.FcmError","errorCode":"UNREGISTERED"}]}}"#;
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, body),
            DeliveryOutcome::InvalidToken
        );
    }

    #[test]
    fn malformed_message_keeps_the_token() {
        let body = r#"{"error":{"code":400,"status":"INVALID_ARGUMENT","message":"Invalid JSON payload","details":[{"errorCode":"INVALID_ARGUMENT"}]}}"#;
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, body),
            DeliveryOutcome::Failed(_)
        ));
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, "UNREGISTERED but not json"),
            DeliveryOutcome::Failed(_)
        ));
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(matches!(
            classify(StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            DeliveryOutcome::Failed(_)
        ));
    }

    #[test]
    fn body_carries_link_and_data() {
        let mut data = BTreeMap::new();
        data.insert("circleId".to_string(), "c1".to_string());
        let message = PushMessage {
            tokens: vec!["t".into()],
            title: "Reminder".into(),
            body: "Pay up".into(),
            data,
            link: Some("/circles/c1/events/e1/payments".into()),
        };
        let body = FcmPushSender::body(&message, "t");
        assert_eq!(body["message"]["token"], "t");
        assert_eq!(body["message"]["data"]["circleId"], "c1");
        assert_eq!(
            body["message"]["webpush"]["fcm_options"]["link"],
            "/circles/c1/events/e1/payments"
        );
    }
}
