//! HTTP Activation Gateway
//!
//! Forwards `{uid, token}` from an emailed GET link to the JSON activation
//! endpoint, so activation runs through the same handler either way.

use std::time::Duration;

use serde_json::json;

use crate::domain::gateway::{ActivationGateway, ActivationOutcome};
use crate::error::{UsersError, UsersResult};

pub const ACTIVATION_PATH: &str = "/api/auth/users/activation";

#[derive(Debug, Clone)]
pub struct HttpActivationGateway {
    http: reqwest::Client,
}

impl HttpActivationGateway {
    pub fn new(timeout: Duration) -> UsersResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UsersError::Internal(format!("HTTP client setup failed: {e}")))?;
        Ok(Self { http })
    }
}

impl ActivationGateway for HttpActivationGateway {
    async fn activate(&self, base_url: &str, uid: &str, token: &str) -> ActivationOutcome {
        let url = format!("{}{ACTIVATION_PATH}", base_url.trim_end_matches('/'));

        let response = match self
            .http
            .post(&url)
            .json(&json!({ "uid": uid, "token": token }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "Activation request failed");
                return ActivationOutcome::Failed {
                    upstream: json!({ "error": e.to_string() }),
                };
            }
        };

        let status = response.status();
        if status.is_success() {
            return ActivationOutcome::Activated;
        }

        let text = response.text().await.unwrap_or_default();
        let upstream = serde_json::from_str(&text).unwrap_or_else(|_| {
            json!({ "status": status.as_u16(), "body": text })
        });

        ActivationOutcome::Failed { upstream }
    }
}
