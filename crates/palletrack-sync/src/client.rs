//! # Webhook Delivery Client
//!
//! HTTP delivery of payload envelopes to the remote spreadsheet webhook.
//!
//! ## Acceptance Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Delivery Outcome Decision                           │
//! │                                                                         │
//! │  POST <endpoint>  Content-Type: application/json  body = payload       │
//! │       │                                                                 │
//! │       ├── connect error / timeout ───────────► Transport / Timeout     │
//! │       │                                                                 │
//! │       ├── non-2xx status ────────────────────► Rejected {status, body} │
//! │       │                                                                 │
//! │       └── 2xx                                                           │
//! │             ├── body parses as JSON with "ok": true ──► ACCEPTED        │
//! │             └── anything else ───────────────► Rejected {status, body} │
//! │                                                                         │
//! │  No internal retry: re-delivery happens via the outbox on the next     │
//! │  triggered flush.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::payload::SyncPayload;

// =============================================================================
// Delivery Trait
// =============================================================================

/// Delivers one payload to the remote system.
///
/// The engine only knows this seam; tests substitute a scripted
/// implementation, production uses [`HttpDelivery`].
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Attempts to deliver a single payload.
    ///
    /// `Ok(())` means the remote explicitly accepted it; every other outcome
    /// is an error and the caller decides whether the payload stays queued.
    async fn deliver(&self, payload: &SyncPayload) -> SyncResult<()>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// reqwest-backed webhook delivery.
#[derive(Debug)]
pub struct HttpDelivery {
    client: reqwest::Client,
    endpoint: Url,
    timeout_secs: u64,
}

impl HttpDelivery {
    /// Creates a delivery client from the sync configuration.
    ///
    /// ## Errors
    /// * [`SyncError::InvalidUrl`] - endpoint is not a parseable URL
    /// * [`SyncError::Transport`] - the HTTP client could not be built
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let endpoint = Url::parse(&config.endpoint_url)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(HttpDelivery {
            client,
            endpoint,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Delivery for HttpDelivery {
    async fn deliver(&self, payload: &SyncPayload) -> SyncResult<()> {
        debug!(endpoint = %self.endpoint, "Posting payload to webhook");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SyncError::Timeout(self.timeout_secs)
                } else {
                    SyncError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(SyncError::Rejected {
                status: Some(status.as_u16()),
                body,
            });
        }

        // Acceptance requires an explicit {"ok": true}; a 2xx with any other
        // body shape is still a rejection.
        let accepted = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("ok").and_then(|ok| ok.as_bool()))
            .unwrap_or(false);

        if accepted {
            debug!("Webhook accepted payload");
            Ok(())
        } else {
            Err(SyncError::Rejected {
                status: Some(status.as_u16()),
                body,
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> SyncConfig {
        SyncConfig {
            endpoint_url: url.to_string(),
            api_key: "SECRET-1".to_string(),
            ..SyncConfig::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let err = HttpDelivery::new(&config("not a url")).unwrap_err();
        assert!(matches!(err, SyncError::InvalidUrl(_)));
    }

    #[test]
    fn test_new_accepts_https_endpoint() {
        let delivery = HttpDelivery::new(&config("https://script.example.com/exec"));
        assert!(delivery.is_ok());
    }
}
