//! Server Configuration
//!
//! Environment-driven settings for the API binary.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use base64::Engine;
use base64::engine::general_purpose;
use secrecy::SecretString;
use users::UsersConfig;
use users::infra::SmtpSettings;
use users::infra::authy::DEFAULT_AUTHY_API_URL;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub authy_api_url: String,
    pub authy_api_key: SecretString,
    pub provider_timeout: Duration,
    /// `None` selects the log mailer
    pub smtp: Option<SmtpSettings>,
    pub users: UsersConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

        let bind_addr = env_or("BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let frontend_origins = split_list(&env_or("FRONTEND_ORIGINS", DEFAULT_FRONTEND_ORIGINS));

        let authy_api_key = env::var("AUTHY_API_KEY")
            .map(SecretString::from)
            .context("AUTHY_API_KEY must be set in environment")?;

        let provider_timeout =
            Duration::from_secs(parse_env("PROVIDER_TIMEOUT_SECS", 10u64)?);

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpSettings {
                host,
                port: parse_env("SMTP_PORT", 587u16)?,
                username: env_or("SMTP_USERNAME", ""),
                password: SecretString::from(env_or("SMTP_PASSWORD", "")),
                from_address: env_or("EMAIL_FROM", "no-reply@localhost"),
            }),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins,
            authy_api_url: env_or("AUTHY_API_URL", DEFAULT_AUTHY_API_URL),
            authy_api_key,
            provider_timeout,
            smtp,
            users: users_config(bind_addr)?,
        })
    }
}

fn users_config(bind_addr: SocketAddr) -> anyhow::Result<UsersConfig> {
    let base = if cfg!(debug_assertions) {
        UsersConfig::development()
    } else {
        UsersConfig::default()
    };

    let session_secret = match env::var("SECRET_KEY") {
        Ok(secret_b64) => {
            let secret_bytes = general_purpose::STANDARD.decode(secret_b64.trim())?;
            let Ok(secret) = <[u8; 32]>::try_from(secret_bytes.as_slice()) else {
                bail!("SECRET_KEY must decode to 32 bytes");
            };
            secret
        }
        // Debug builds fall back to the random development secret
        Err(_) if cfg!(debug_assertions) => base.session_secret,
        Err(_) => bail!("SECRET_KEY must be set in production"),
    };

    Ok(UsersConfig {
        session_secret,
        cookie_secure: parse_env("COOKIE_SECURE", base.cookie_secure)?,
        send_activation_email: parse_env("SEND_ACTIVATION_EMAIL", base.send_activation_email)?,
        activation_protocol: env_or("ACTIVATION_PROTOCOL", &base.activation_protocol),
        activation_domain: env::var("ACTIVATION_DOMAIN")
            .ok()
            .filter(|domain| !domain.trim().is_empty()),
        allowed_hosts: match env::var("ALLOWED_HOSTS") {
            Ok(raw) => split_list(&raw),
            Err(_) => base.allowed_hosts.clone(),
        },
        // The GET activation link calls back into this server
        activation_proxy_url: Some(env_or(
            "ACTIVATION_PROXY_URL",
            &format!("http://127.0.0.1:{}", bind_addr.port()),
        )),
        activation_token_ttl: Duration::from_secs(parse_env(
            "ACTIVATION_TOKEN_TTL_SECS",
            base.activation_token_ttl.as_secs(),
        )?),
        site_name: env_or("SITE_NAME", &base.site_name),
        ..base
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value")),
        Err(_) => Ok(default),
    }
}
