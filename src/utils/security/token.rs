use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<u64>,
    #[serde(default)]
    pub iat: Option<u64>,
}

/// Reads the claims of tokens issued by the clinic API. The signing key
/// belongs to the API, so signatures are not checked here; only `exp` is used.
pub struct TokenInspector;

impl TokenInspector {

    pub fn claims(token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_aud = false;

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .ok()
    }

    pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
        Self::claims(token)
            .and_then(|claims| claims.exp)
            .and_then(|exp| DateTime::<Utc>::from_timestamp(exp as i64, 0))
    }

    /// Opaque tokens and tokens without `exp` never expire on this side.
    pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
        match Self::expires_at(token) {
            Some(expiration) => expiration <= now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token_with(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"clinic_api_secret"),
        ).unwrap()
    }

    #[test]
    fn test_fresh_token_is_not_expired() {
        let now = Utc::now();
        let token = token_with(json!({
            "sub": "ana@patitas.com",
            "exp": (now + Duration::hours(1)).timestamp(),
        }));

        assert!(!TokenInspector::is_expired(&token, now));
        let expires = TokenInspector::expires_at(&token).unwrap();
        assert!(expires > now);
    }

    #[test]
    fn test_past_token_is_expired() {
        let now = Utc::now();
        let token = token_with(json!({
            "sub": "ana@patitas.com",
            "exp": (now - Duration::minutes(5)).timestamp(),
        }));

        assert!(TokenInspector::is_expired(&token, now));
    }

    #[test]
    fn test_token_without_exp_never_expires() {
        let token = token_with(json!({ "id": 7, "rol": "admin" }));

        assert!(TokenInspector::claims(&token).is_some());
        assert!(TokenInspector::expires_at(&token).is_none());
        assert!(!TokenInspector::is_expired(&token, Utc::now()));
    }

    #[test]
    fn test_signature_from_any_key_is_accepted() {
        let now = Utc::now();
        let token = encode(
            &Header::default(),
            &json!({ "exp": (now + Duration::hours(2)).timestamp() }),
            &EncodingKey::from_secret(b"another_secret"),
        ).unwrap();

        assert!(TokenInspector::expires_at(&token).is_some());
    }

    #[test]
    fn test_opaque_token_is_not_expired() {
        let now = Utc::now();
        for token in ["opaque-token", "header.only", "a.b.c", ""] {
            assert!(TokenInspector::claims(token).is_none());
            assert!(!TokenInspector::is_expired(token, now));
        }
    }
}
