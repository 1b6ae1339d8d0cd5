//! Access token signing and verification
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! with claims `{email, iat, exp}` (Unix seconds).
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies; the request middleware lives in vms-api.
//! The current time is passed in so expiry is testable.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Identity carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Reasons a token is refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("invalid signing key")]
    InvalidKey,

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

fn mac_for(secret: &str, signing_input: &str) -> Result<HmacSha256, TokenError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

/// Issue a signed token for `email` valid for `ttl` from `now`
pub fn issue_token(
    email: &str,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let header = Header {
        alg: ALGORITHM.to_string(),
        typ: "JWT".to_string(),
    };
    let claims = Claims {
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
    let signature = mac_for(secret, &signing_input)?.finalize().into_bytes();

    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

/// Verify structure, algorithm, signature and expiry; return the claims
///
/// A token is expired once `now` reaches `exp`.
pub fn verify_token(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (header_b64, claims_b64, signature_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) if !h.is_empty() && !c.is_empty() && !s.is_empty() => (h, c, s),
        _ => return Err(TokenError::Malformed),
    };

    let header: Header = decode_segment(header_b64)?;
    if header.alg != ALGORITHM {
        return Err(TokenError::UnsupportedAlgorithm(header.alg));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::Malformed)?;
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    // verify_slice compares in constant time
    mac_for(secret, &signing_input)?
        .verify_slice(&signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    let claims: Claims = decode_segment(claims_b64)?;
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "test-secret";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let token = issue_token("a@b.com", SECRET, Duration::hours(24), t0()).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = verify_token(&token, SECRET, t0() + Duration::hours(1)).unwrap();
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.iat, t0().timestamp());
        assert_eq!(claims.exp, (t0() + Duration::hours(24)).timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("a@b.com", SECRET, Duration::hours(1), t0()).unwrap();
        assert_eq!(
            verify_token(&token, "other-secret", t0()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token("a@b.com", SECRET, Duration::hours(1), t0()).unwrap();
        assert_eq!(
            verify_token(&token, SECRET, t0() + Duration::hours(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let token = issue_token("a@b.com", SECRET, Duration::hours(1), t0()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = encode_segment(&Claims {
            email: "admin@b.com".into(),
            iat: t0().timestamp(),
            exp: (t0() + Duration::days(365)).timestamp(),
        })
        .unwrap();
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

        assert_eq!(verify_token(&forged, SECRET, t0()), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        for bad in ["", "abc", "a.b", "a.b.c.d", "..", "!!!.@@@.###"] {
            assert_eq!(verify_token(bad, SECRET, t0()), Err(TokenError::Malformed), "input: {bad:?}");
        }
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let header = encode_segment(&Header { alg: "none".into(), typ: "JWT".into() }).unwrap();
        let claims = encode_segment(&Claims { email: "a@b.com".into(), iat: 0, exp: i64::MAX }).unwrap();
        let token = format!("{}.{}.c2ln", header, claims);

        assert_eq!(
            verify_token(&token, SECRET, t0()),
            Err(TokenError::UnsupportedAlgorithm("none".into()))
        );
    }
}
