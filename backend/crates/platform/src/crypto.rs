//! Cryptographic Utilities
//!
//! SHA-256, URL-safe Base64 and HMAC-SHA256 signed tokens.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode bytes as unpadded URL-safe base64
pub fn to_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded URL-safe base64; trailing `=` padding is tolerated
pub fn from_base64url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(s.trim_end_matches('='))
}

/// Compute HMAC-SHA256 over `data`
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Constant-time HMAC-SHA256 verification
pub fn verify_hmac_sha256(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    match HmacSha256::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(data);
            mac.verify_slice(tag).is_ok()
        }
        Err(_) => false,
    }
}

/// Sign `payload` as `"{payload}.{base64url(hmac)}"`
///
/// `payload` must not contain `.`.
pub fn sign_token(key: &[u8], payload: &str) -> String {
    let tag = hmac_sha256(key, payload.as_bytes());
    format!("{}.{}", payload, to_base64url(&tag))
}

/// Verify a token produced by [`sign_token`] and return its payload
pub fn verify_token<'a>(key: &[u8], token: &'a str) -> Option<&'a str> {
    let (payload, tag_b64) = token.split_once('.')?;
    if tag_b64.contains('.') {
        return None;
    }
    let tag = from_base64url(tag_b64).ok()?;
    verify_hmac_sha256(key, payload.as_bytes(), &tag).then_some(payload)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        let expected =
            hex::decode("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
                .unwrap();
        assert_eq!(mac.to_vec(), expected);
        assert!(verify_hmac_sha256(b"Jefe", b"what do ya want for nothing?", &expected));
        assert!(!verify_hmac_sha256(b"Jefe", b"something else", &expected));
    }

    #[test]
    fn test_base64url_accepts_padding() {
        let encoded = to_base64url(b"ab");
        assert!(!encoded.contains('='));
        assert_eq!(from_base64url(&format!("{encoded}==")).unwrap(), b"ab");
    }

    #[test]
    fn test_signed_token() {
        let key = [7u8; 32];
        let token = sign_token(&key, "8f3c2d1e-session");
        assert_eq!(verify_token(&key, &token), Some("8f3c2d1e-session"));

        // Wrong key
        assert_eq!(verify_token(&[8u8; 32], &token), None);

        // Tampered payload
        let tampered = token.replacen("8f3c", "0000", 1);
        assert_eq!(verify_token(&key, &tampered), None);

        // Malformed
        assert_eq!(verify_token(&key, "no-signature"), None);
        assert_eq!(verify_token(&key, "a.b.c"), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[1, 2], &[1, 2, 3]));
    }
}
