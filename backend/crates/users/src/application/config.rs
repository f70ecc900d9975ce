//! Application Configuration
//!
//! Configuration for the users application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::{sign_token, verify_token};
use platform::password::PasswordPolicy;
use uuid::Uuid;

use crate::domain::activation_token::{ActivationTokenGenerator, encode_uid};
use crate::domain::entity::User;
use crate::error::{UsersError, UsersResult};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Users application configuration
#[derive(Debug, Clone)]
pub struct UsersConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Secret key for session and activation token HMACs (32 bytes)
    pub session_secret: [u8; 32],
    /// Session TTL without "Remember Me" (12 hours)
    pub session_ttl_short: Duration,
    /// Session TTL with "Remember Me" (1 week)
    pub session_ttl_long: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    pub password_policy: PasswordPolicy,
    /// Email customers an activation link after registration
    pub send_activation_email: bool,
    /// Scheme of activation links ("https" / "http")
    pub activation_protocol: String,
    /// Host of activation links; an allowed request `Host` when unset
    pub activation_domain: Option<String>,
    /// Request hosts trusted for activation links (`.example.com` matches
    /// subdomains, `*` matches any host)
    pub allowed_hosts: Vec<String>,
    /// Base URL the GET activation link forwards to
    pub activation_proxy_url: Option<String>,
    /// Activation token lifetime (3 days)
    pub activation_token_ttl: Duration,
    /// Site name used in outgoing emails
    pub site_name: String,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "users_session".to_string(),
            session_secret: [0u8; 32],
            session_ttl_short: Duration::from_secs(12 * 3600), // 12 hours
            session_ttl_long: Duration::from_secs(7 * 24 * 3600), // 1 week
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            password_policy: PasswordPolicy::default(),
            send_activation_email: true,
            activation_protocol: "https".to_string(),
            activation_domain: None,
            allowed_hosts: Vec::new(),
            activation_proxy_url: None,
            activation_token_ttl: Duration::from_secs(3 * 24 * 3600),
            site_name: "Marketplace".to_string(),
        }
    }
}

impl UsersConfig {
    /// Create config with a random secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie, http links)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            activation_protocol: "http".to_string(),
            allowed_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn cookie(&self) -> CookieConfig {
        CookieConfig::new(
            self.session_cookie_name.clone(),
            self.cookie_secure,
            self.cookie_same_site,
        )
    }

    pub fn token_generator(&self) -> UsersResult<ActivationTokenGenerator> {
        let ttl = chrono::Duration::from_std(self.activation_token_ttl)
            .map_err(|e| UsersError::Internal(format!("Invalid activation TTL: {e}")))?;
        Ok(ActivationTokenGenerator::new(self.session_secret, ttl))
    }

    /// `{protocol}://{domain}`, falling back to an allowed request host
    pub fn activation_base_url(&self, request_host: Option<&str>) -> String {
        let domain = self
            .activation_domain
            .as_deref()
            .or_else(|| self.trusted_host(request_host))
            .unwrap_or("localhost");
        format!("{}://{}", self.activation_protocol, domain)
    }

    /// Where the GET activation link forwards; never taken from the request
    pub fn activation_proxy_base_url(&self) -> String {
        match &self.activation_proxy_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.activation_base_url(None),
        }
    }

    /// The request host, when it is on the allow-list
    pub fn trusted_host<'a>(&self, request_host: Option<&'a str>) -> Option<&'a str> {
        let host = request_host?.trim();
        let name = strip_port(host).to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }

        let allowed = self.allowed_hosts.iter().any(|pattern| {
            let pattern = pattern.trim().to_ascii_lowercase();
            if pattern == "*" {
                return true;
            }
            match pattern.strip_prefix('.') {
                Some(domain) => name == domain || name.ends_with(&pattern),
                None => name == pattern,
            }
        });

        if !allowed {
            tracing::warn!(host = %host, "Untrusted Host header ignored for activation link");
            return None;
        }
        Some(host)
    }

    /// Link emailed to customers
    pub fn activation_url(&self, request_host: Option<&str>, uid: &str, token: &str) -> String {
        format!(
            "{}/api/auth/users/activate/{uid}/{token}",
            self.activation_base_url(request_host)
        )
    }

    /// Activation link for `user`, with a fresh token
    pub fn activation_link(&self, user: &User, request_host: Option<&str>) -> UsersResult<String> {
        let token = self.token_generator()?.make_token(user);
        Ok(self.activation_url(request_host, &encode_uid(&user.user_id), &token))
    }

    /// Signed session token for the cookie
    pub fn session_token(&self, session_id: Uuid) -> String {
        sign_token(&self.session_secret, &session_id.to_string())
    }

    /// Verify a session token and return its session id
    pub fn parse_session_token(&self, token: &str) -> UsersResult<Uuid> {
        verify_token(&self.session_secret, token)
            .and_then(|id| id.parse().ok())
            .ok_or(UsersError::SessionInvalid)
    }
}

/// `example.com:8000` -> `example.com`, `[::1]:8000` -> `[::1]`
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
