//! Client identification utilities
//!
//! Sessions are bound to the client that created them through a hash of
//! its User-Agent; the IP is recorded for auditing only.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

use crate::crypto::sha256;

/// Client fingerprint derived from request headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFingerprint {
    /// SHA-256 of the User-Agent header
    pub hash: [u8; 32],
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientFingerprint {
    pub fn from_user_agent(user_agent: &str, ip: Option<IpAddr>) -> Self {
        Self {
            hash: sha256(user_agent.as_bytes()),
            ip,
            user_agent: Some(user_agent.to_string()),
        }
    }

    pub fn hash_vec(&self) -> Vec<u8> {
        self.hash.to_vec()
    }

    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

/// Error when extracting client fingerprint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FingerprintError {
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),
}

/// Fingerprint the client from its User-Agent header
pub fn extract_fingerprint(
    headers: &HeaderMap,
    client_ip: Option<IpAddr>,
) -> Result<ClientFingerprint, FingerprintError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or(FingerprintError::MissingHeader("User-Agent"))?;

    Ok(ClientFingerprint::from_user_agent(user_agent, client_ip))
}

/// Client IP: first `X-Forwarded-For` entry, else the direct peer
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_fingerprint() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0 Test"));

        let fp = extract_fingerprint(&headers, None).unwrap();
        assert_eq!(fp, ClientFingerprint::from_user_agent("Mozilla/5.0 Test", None));
        assert_eq!(fp.user_agent.as_deref(), Some("Mozilla/5.0 Test"));
    }

    #[test]
    fn test_extract_fingerprint_missing_or_blank_ua() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            extract_fingerprint(&headers, None),
            Err(FingerprintError::MissingHeader("User-Agent"))
        );

        headers.insert(header::USER_AGENT, HeaderValue::from_static(" "));
        assert!(extract_fingerprint(&headers, None).is_err());
    }

    #[test]
    fn test_extract_client_ip() {
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, Some(direct)), Some(direct));

        headers.insert("x-forwarded-for", HeaderValue::from_static("192.168.1.1, 10.0.0.1"));
        assert_eq!(
            extract_client_ip(&headers, Some(direct)),
            Some("192.168.1.1".parse().unwrap())
        );

        headers.insert("x-forwarded-for", HeaderValue::from_static("garbage"));
        assert_eq!(extract_client_ip(&headers, Some(direct)), Some(direct));
    }
}
