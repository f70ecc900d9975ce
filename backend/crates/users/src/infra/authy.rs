//! Authy Phone Verification Client
//!
//! REST client for the Authy phone verification and user registration API.
//! Provider-side refusals (bad number, wrong code) surface as
//! [`UsersError::Provider`]; transport failures and 5xx responses as
//! [`UsersError::ProviderUnavailable`].

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::gateway::{ProviderRejection, VerificationProvider};
use crate::domain::value_object::{Email, PhoneNumber, VerificationId};
use crate::error::{UsersError, UsersResult};

pub const DEFAULT_AUTHY_API_URL: &str = "https://api.authy.com";

const API_KEY_HEADER: &str = "X-Authy-API-Key";

#[derive(Clone)]
pub struct AuthyClient {
    http: reqwest::Client,
    api_url: String,
    api_key: SecretString,
}

impl fmt::Debug for AuthyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthyClient")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct AuthyErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthyStatusBody {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct AuthyUserBody {
    user: AuthyUser,
}

#[derive(Debug, Deserialize)]
struct AuthyUser {
    id: serde_json::Value,
}

impl AuthyClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> UsersResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UsersError::Internal(format!("HTTP client setup failed: {e}")))?;

        let api_url: String = api_url.into();
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> UsersResult<T> {
        let response = request
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| UsersError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| UsersError::ProviderUnavailable(format!("Invalid response: {e}")));
        }

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(UsersError::ProviderUnavailable(format!(
                "Authy request failed with status {status}"
            )));
        }

        let body = response.json::<AuthyErrorBody>().await.ok();
        let (message, error_code) = body
            .map(|b| (b.message, b.error_code))
            .unwrap_or((None, None));

        Err(UsersError::Provider(ProviderRejection::new(
            message.unwrap_or_else(|| format!("Authy request failed with status {status}")),
            error_code,
        )))
    }

    /// Treat a 2xx body with `success: false` as a rejection
    fn ensure_success(body: AuthyStatusBody) -> UsersResult<()> {
        if body.success {
            return Ok(());
        }
        Err(UsersError::Provider(ProviderRejection::new(
            body.message
                .unwrap_or_else(|| "Phone verification failed".to_string()),
            body.error_code,
        )))
    }
}

impl VerificationProvider for AuthyClient {
    async fn start_verification(&self, phone: &PhoneNumber) -> UsersResult<()> {
        let country_code = phone.country_code().to_string();
        let request = self
            .http
            .post(self.url("/protected/json/phones/verification/start"))
            .form(&[
                ("via", "sms"),
                ("phone_number", phone.national_number()),
                ("country_code", country_code.as_str()),
            ]);

        let body: AuthyStatusBody = self.send(request).await?;
        Self::ensure_success(body)
    }

    async fn check_verification(&self, phone: &PhoneNumber, code: &str) -> UsersResult<()> {
        let country_code = phone.country_code().to_string();
        let request = self
            .http
            .get(self.url("/protected/json/phones/verification/check"))
            .query(&[
                ("phone_number", phone.national_number()),
                ("country_code", country_code.as_str()),
                ("verification_code", code),
            ]);

        let body: AuthyStatusBody = self.send(request).await?;
        Self::ensure_success(body)
    }

    async fn register_user(
        &self,
        email: &Email,
        phone: &PhoneNumber,
    ) -> UsersResult<VerificationId> {
        let country_code = phone.country_code().to_string();
        let request = self
            .http
            .post(self.url("/protected/json/users/new"))
            .form(&[
                ("user[email]", email.as_str()),
                ("user[cellphone]", phone.national_number()),
                ("user[country_code]", country_code.as_str()),
            ]);

        let body: AuthyUserBody = self.send(request).await?;
        let id = match body.user.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };

        VerificationId::new(id.clone())
            .ok_or_else(|| UsersError::ProviderUnavailable(format!("Unexpected Authy id: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, Uri, header};
    use axum::response::IntoResponse;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Answers every request with one scripted response and records it
    #[derive(Clone)]
    struct ScriptedAuthy {
        status: axum::http::StatusCode,
        body: &'static str,
        requests: Arc<Mutex<Vec<String>>>,
    }

    async fn respond(
        State(authy): State<ScriptedAuthy>,
        headers: HeaderMap,
        uri: Uri,
        body: String,
    ) -> impl IntoResponse {
        let api_key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        authy
            .requests
            .lock()
            .await
            .push(format!("{api_key} {uri} {body}"));
        (
            authy.status,
            [(header::CONTENT_TYPE, "application/json")],
            authy.body,
        )
    }

    async fn client_for(status: u16, body: &'static str) -> (AuthyClient, Arc<Mutex<Vec<String>>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(respond).with_state(ScriptedAuthy {
            status: axum::http::StatusCode::from_u16(status).unwrap(),
            body,
            requests: requests.clone(),
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = AuthyClient::new(
            format!("http://{addr}/"),
            SecretString::from("test-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        (client, requests)
    }

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("+12125552368").unwrap()
    }

    #[tokio::test]
    async fn test_start_verification_sends_national_number() {
        let (client, requests) = client_for(200, r#"{"success":true}"#).await;

        client.start_verification(&phone()).await.unwrap();

        let requests = requests.lock().await;
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.starts_with("test-key /protected/json/phones/verification/start "));
        assert!(request.contains("via=sms"));
        assert!(request.contains("phone_number=2125552368"));
        assert!(request.contains("country_code=1"));
    }

    #[tokio::test]
    async fn test_client_error_is_provider_rejection() {
        let (client, _) = client_for(
            400,
            r#"{"message":"Phone number is invalid","error_code":"60033"}"#,
        )
        .await;

        let err = client.start_verification(&phone()).await.unwrap_err();
        match err {
            UsersError::Provider(rejection) => {
                assert_eq!(rejection.message, "Phone number is invalid");
                assert_eq!(rejection.error_code.as_deref(), Some("60033"));
            }
            other => panic!("expected provider rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_error_without_body_names_status() {
        let (client, _) = client_for(401, "not json").await;

        let err = client.start_verification(&phone()).await.unwrap_err();
        match err {
            UsersError::Provider(rejection) => {
                assert!(rejection.message.contains("401"));
                assert!(rejection.error_code.is_none());
            }
            other => panic!("expected provider rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_and_throttling_are_unavailable() {
        for status in [500, 503, 429] {
            let (client, _) = client_for(status, r#"{"message":"down"}"#).await;
            let err = client.check_verification(&phone(), "123456").await.unwrap_err();
            assert!(
                matches!(err, UsersError::ProviderUnavailable(_)),
                "status {status} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_unsuccessful_check_is_rejection() {
        let (client, requests) = client_for(
            200,
            r#"{"success":false,"message":"Verification code is incorrect","error_code":"60022"}"#,
        )
        .await;

        let err = client.check_verification(&phone(), "000000").await.unwrap_err();
        match err {
            UsersError::Provider(rejection) => {
                assert_eq!(rejection.message, "Verification code is incorrect");
                assert_eq!(rejection.error_code.as_deref(), Some("60022"));
            }
            other => panic!("expected provider rejection, got {other:?}"),
        }

        let requests = requests.lock().await;
        assert!(requests[0].contains("/protected/json/phones/verification/check?"));
        assert!(requests[0].contains("verification_code=000000"));
    }

    #[tokio::test]
    async fn test_check_accepts_success() {
        let (client, _) = client_for(200, r#"{"success":true,"message":"Verification code is correct."}"#).await;
        client.check_verification(&phone(), "123456").await.unwrap();
    }

    #[tokio::test]
    async fn test_register_user_returns_numeric_id() {
        let (client, requests) = client_for(200, r#"{"user":{"id":123456},"success":true}"#).await;
        let email = Email::new("v@v.com").unwrap();

        let id = client.register_user(&email, &phone()).await.unwrap();
        assert_eq!(id.as_str(), "123456");

        let requests = requests.lock().await;
        assert!(requests[0].contains("/protected/json/users/new"));
        assert!(requests[0].contains("user%5Bemail%5D=v%40v.com"));
        assert!(requests[0].contains("user%5Bcellphone%5D=2125552368"));
    }

    #[tokio::test]
    async fn test_register_user_rejects_oversized_id() {
        let (client, _) = client_for(200, r#"{"user":{"id":"1234567890123"}}"#).await;
        let email = Email::new("v@v.com").unwrap();

        let err = client.register_user(&email, &phone()).await.unwrap_err();
        assert!(matches!(err, UsersError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unparsable_success_body_is_unavailable() {
        let (client, _) = client_for(200, "<html>maintenance</html>").await;
        let email = Email::new("v@v.com").unwrap();

        let err = client.register_user(&email, &phone()).await.unwrap_err();
        assert!(matches!(err, UsersError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = AuthyClient::new(
            format!("http://{addr}"),
            SecretString::from("test-key".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.start_verification(&phone()).await.unwrap_err();
        assert!(matches!(err, UsersError::ProviderUnavailable(_)));
    }
}
