use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// Errors returned by access-token verification.
#[derive(Debug, Error)]
pub enum AccessJwtError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("invalid verification key: {0}")]
    InvalidKey(String),
}

/// Key material the identity provider's tokens are checked against.
#[derive(Clone)]
pub enum VerificationKey {
    /// Shared secret for HS256/HS384/HS512.
    Secret(String),
    /// PEM public key for RS*/PS*/ES*/EdDSA.
    PublicKeyPem(String),
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        match self {
            Self::Secret(_) => f.write_str("Secret(..)"),
            Self::PublicKeyPem(_) => f.write_str("PublicKeyPem(..)"),
        }
    }
}

/// Access token (JWT) claims.
///
/// NOTE:
/// - `sub` is optional here: a verified token without a subject is still attached to the
///   request, and the ownership guards reject it.
/// - Claims we don't model are kept in `extra` (identity providers add their own).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessTokenClaims {
    /// The caller identity, if the token names a non-blank one.
    ///
    /// The value is opaque: it is returned exactly as signed, never trimmed or normalised.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Access-token verifier (signature, `exp`, and `iss`/`aud` when configured).
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(
        algorithm: Algorithm,
        key: &VerificationKey,
        issuer: Option<&str>,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, AccessJwtError> {
        let decoding_key = decoding_key(algorithm, key)?;

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    // Verify and decode a JWT access token.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }
}

fn decoding_key(algorithm: Algorithm, key: &VerificationKey) -> Result<DecodingKey, AccessJwtError> {
    use Algorithm::*;

    let invalid = |e: jsonwebtoken::errors::Error| AccessJwtError::InvalidKey(e.to_string());

    match (algorithm, key) {
        (HS256 | HS384 | HS512, VerificationKey::Secret(secret)) => {
            Ok(DecodingKey::from_secret(secret.as_bytes()))
        }
        (RS256 | RS384 | RS512 | PS256 | PS384 | PS512, VerificationKey::PublicKeyPem(pem)) => {
            DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(invalid)
        }
        (ES256 | ES384, VerificationKey::PublicKeyPem(pem)) => {
            DecodingKey::from_ec_pem(pem.as_bytes()).map_err(invalid)
        }
        (EdDSA, VerificationKey::PublicKeyPem(pem)) => {
            DecodingKey::from_ed_pem(pem.as_bytes()).map_err(invalid)
        }
        (algorithm, key) => Err(AccessJwtError::InvalidKey(format!(
            "{algorithm:?} cannot be verified with {key:?}"
        ))),
    }
}
