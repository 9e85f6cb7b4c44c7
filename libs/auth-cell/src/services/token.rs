use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{Claims, JwtHeader, Role};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token authority is not configured")]
    NotConfigured,

    #[error("invalid token format")]
    Malformed,

    #[error("invalid token signature")]
    Signature,

    #[error("token expired")]
    Expired,

    #[error("failed to encode claims: {0}")]
    Encoding(String),
}

/// Issues and validates the bearer tokens every scheduling operation is
/// gated on. Tokens are HMAC-SHA256 JWTs; validation is stateless and needs
/// nothing beyond the shared secret. The role travels as an explicit claim
/// from the closed {admin, doctor, patient} set.
pub struct TokenAuthority {
    secret: String,
    ttl_secs: i64,
}

impl TokenAuthority {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            ttl_secs: config.token_ttl_secs,
        }
    }

    pub fn from_secret(secret: &str, ttl_secs: i64) -> Self {
        Self {
            secret: secret.to_string(),
            ttl_secs,
        }
    }

    pub fn issue(&self, subject: &str, role: Role) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::NotConfigured);
        }

        let header = JwtHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        let header_json =
            serde_json::to_string(&header).map_err(|e| TokenError::Encoding(e.to_string()))?;
        let claims_json =
            serde_json::to_string(&claims).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| TokenError::NotConfigured)?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// All failure modes collapse to `false`; this call must never error
    /// across the gate boundary.
    pub fn validate(&self, token: &str, expected_role: Role) -> bool {
        match self.decode(token) {
            Ok(claims) => claims.role == expected_role,
            Err(err) => {
                debug!("Token validation failed: {}", err);
                false
            }
        }
    }

    /// Subject of a well-signed, unexpired token, regardless of role.
    pub fn extract_subject(&self, token: &str) -> Option<String> {
        self.decode(token).ok().map(|claims| claims.sub)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::NotConfigured);
        }

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| TokenError::Malformed)?;

        let signing_input = format!("{}.{}", parts[0], parts[1]);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| TokenError::NotConfigured)?;
        mac.update(signing_input.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            return Err(TokenError::Signature);
        }

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;

        if claims.exp < Utc::now().timestamp() {
            debug!("Token expired at {}", claims.exp);
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "test-secret-key-for-token-validation-must-be-long-enough";

    fn authority() -> TokenAuthority {
        TokenAuthority::from_secret(SECRET, 3600)
    }

    #[test]
    fn issued_token_validates_for_its_role() {
        let authority = authority();
        let token = authority.issue("pat@mail.com", Role::Patient).unwrap();

        assert!(authority.validate(&token, Role::Patient));
        assert_eq!(
            authority.extract_subject(&token).as_deref(),
            Some("pat@mail.com")
        );
    }

    #[test]
    fn role_mismatch_fails_validation_but_keeps_subject() {
        let authority = authority();
        let token = authority.issue("dr@clinic.ie", Role::Doctor).unwrap();

        assert!(!authority.validate(&token, Role::Admin));
        assert!(!authority.validate(&token, Role::Patient));
        // Subject extraction is role-agnostic.
        assert_eq!(
            authority.extract_subject(&token).as_deref(),
            Some("dr@clinic.ie")
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let authority = authority();
        let token = authority.issue("pat@mail.com", Role::Patient).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "sub": "pat@mail.com",
                "role": "admin",
                "iat": 0,
                "exp": i64::MAX
            })
            .to_string(),
        );
        parts[1] = &forged_claims;
        let forged = parts.join(".");

        assert!(!authority.validate(&forged, Role::Admin));
        assert!(authority.extract_subject(&forged).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let authority = TokenAuthority::from_secret(SECRET, -60);
        let token = authority.issue("pat@mail.com", Role::Patient).unwrap();

        assert!(!authority.validate(&token, Role::Patient));
        assert_matches!(authority.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn malformed_and_foreign_tokens_are_rejected() {
        let authority = authority();

        assert!(!authority.validate("not-a-token", Role::Patient));
        assert!(!authority.validate("a.b", Role::Patient));
        assert!(authority.extract_subject("").is_none());

        let other = TokenAuthority::from_secret("a-completely-different-secret-value", 3600);
        let foreign = other.issue("pat@mail.com", Role::Patient).unwrap();
        assert!(!authority.validate(&foreign, Role::Patient));
    }

    #[test]
    fn empty_secret_never_issues_or_validates() {
        let authority = TokenAuthority::from_secret("", 3600);
        assert_matches!(
            authority.issue("x", Role::Admin),
            Err(TokenError::NotConfigured)
        );
        assert!(!authority.validate("a.b.c", Role::Admin));
    }
}
