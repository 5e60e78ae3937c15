//! Handshake Authentication
//!
//! Validates JWTs minted by the external auth broker; the server never
//! issues tokens. A missing or invalid token is not an error at the
//! connection level: the session degrades to guest and can still play.

use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::network::session::AuthBinding;

/// Authentication configuration.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Expected issuer claim; None accepts any issuer.
    pub issuer: Option<String>,
    /// Expected audience claim; None skips audience validation.
    pub audience: Option<String>,
    /// RS256 public key in PEM format (external providers).
    pub public_key_pem: Option<String>,
    /// HS256 shared secret (simple setups).
    pub secret: Option<String>,
}

impl AuthConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            issuer: std::env::var("AUTH_ISSUER").ok(),
            audience: std::env::var("AUTH_AUDIENCE").ok(),
            public_key_pem: std::env::var("AUTH_PUBLIC_KEY_PEM").ok(),
            secret: std::env::var("AUTH_SECRET").ok(),
        }
    }

    /// Whether any validation key is configured. Without one, every
    /// session is a guest.
    pub fn is_configured(&self) -> bool {
        self.public_key_pem.is_some() || self.secret.is_some()
    }
}

/// Claims expected from the auth broker.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject: the broker's user id.
    pub sub: String,
    /// Expiry timestamp (Unix seconds).
    #[serde(default)]
    pub exp: u64,
    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience.
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
}

/// Token validation failures. All of them degrade the session to guest.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No validation key configured on the server.
    #[error("authentication not configured")]
    NotConfigured,
    /// Signature, expiry, issuer, or audience check failed.
    #[error("token rejected: {0}")]
    Rejected(String),
    /// The subject claim is missing or empty.
    #[error("missing subject claim")]
    MissingSubject,
}

/// Validate a token and extract its claims.
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<Claims, AuthError> {
    if !config.is_configured() {
        return Err(AuthError::NotConfigured);
    }

    let algorithm = if config.public_key_pem.is_some() {
        Algorithm::RS256
    } else {
        Algorithm::HS256
    };

    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims = std::collections::HashSet::new();
    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }
    match config.audience {
        Some(ref audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    let token_data: TokenData<Claims> = if let Some(ref pem) = config.public_key_pem {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::Rejected(format!("invalid public key: {e}")))?;
        decode(token, &key, &validation).map_err(|e| AuthError::Rejected(e.to_string()))?
    } else if let Some(ref secret) = config.secret {
        let key = DecodingKey::from_secret(secret.as_bytes());
        decode(token, &key, &validation).map_err(|e| AuthError::Rejected(e.to_string()))?
    } else {
        return Err(AuthError::NotConfigured);
    };

    let claims = token_data.claims;
    if claims.sub.is_empty() {
        return Err(AuthError::MissingSubject);
    }
    Ok(claims)
}

/// Resolve a handshake token into the session's one-time auth binding.
///
/// Guests (no token) and rejected tokens both produce an anonymous
/// binding; validation failure is logged but never refuses the
/// connection.
pub fn authenticate(token: Option<&str>, config: &AuthConfig) -> AuthBinding {
    let Some(token) = token else {
        return AuthBinding::guest();
    };
    match validate_token(token, config) {
        Ok(claims) => AuthBinding::user(claims.sub),
        Err(err) => {
            warn!(error = %err, "handshake token rejected, degrading to guest");
            AuthBinding::guest()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: u64,
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn make_token(sub: &str, exp: u64, secret: &str) -> String {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(secret.as_bytes());
        encode(&header, &TestClaims { sub: sub.into(), exp }, &key).unwrap()
    }

    fn hs_config(secret: &str) -> AuthConfig {
        AuthConfig {
            secret: Some(secret.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_token_yields_user_binding() {
        let secret = "test-secret-key-256-bits-long!!";
        let token = make_token("user123", now_secs() + 3600, secret);

        let binding = authenticate(Some(&token), &hs_config(secret));
        assert_eq!(binding.user_id.as_deref(), Some("user123"));
        assert!(!binding.is_anonymous);
    }

    #[test]
    fn test_missing_token_is_guest() {
        let binding = authenticate(None, &hs_config("secret"));
        assert!(binding.user_id.is_none());
        assert!(binding.is_anonymous);
    }

    #[test]
    fn test_expired_token_degrades_to_guest() {
        let secret = "test-secret-key-256-bits-long!!";
        let token = make_token("user123", 1, secret);

        let binding = authenticate(Some(&token), &hs_config(secret));
        assert!(binding.is_anonymous);
    }

    #[test]
    fn test_wrong_signature_degrades_to_guest() {
        let token = make_token("user123", now_secs() + 3600, "right-secret");
        let binding = authenticate(Some(&token), &hs_config("wrong-secret"));
        assert!(binding.is_anonymous);
    }

    #[test]
    fn test_unconfigured_server_means_guests_only() {
        let token = make_token("user123", now_secs() + 3600, "secret");
        let binding = authenticate(Some(&token), &AuthConfig::default());
        assert!(binding.is_anonymous);
    }

    #[test]
    fn test_empty_subject_rejected() {
        let secret = "test-secret-key-256-bits-long!!";
        let token = make_token("", now_secs() + 3600, secret);
        let result = validate_token(&token, &hs_config(secret));
        assert!(matches!(result, Err(AuthError::MissingSubject)));
    }

    #[test]
    fn test_issuer_mismatch_rejected() {
        let secret = "test-secret-key-256-bits-long!!";
        let token = make_token("user123", now_secs() + 3600, secret);
        let config = AuthConfig {
            secret: Some(secret.into()),
            issuer: Some("expected-issuer".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_token(&token, &config),
            Err(AuthError::Rejected(_))
        ));
    }
}
