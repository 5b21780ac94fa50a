//! Development tokens.
//!
//! `mint` signs an HS256 token the API accepts when it runs with `AUTH_JWT_ALGORITHM=HS256`.
//! `inspect` only decodes: it never checks the signature, so its output is not proof of anything.
use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Map, Value, json};

pub struct MintOptions<'a> {
    pub sub: &'a str,
    pub secret: &'a str,
    pub ttl_seconds: i64,
    pub issuer: Option<&'a str>,
    pub audience: Option<&'a str>,
}

pub fn mint(opts: &MintOptions<'_>, now: i64) -> Result<String> {
    if opts.sub.trim().is_empty() {
        bail!("--sub must not be empty");
    }

    let mut claims = Map::new();
    claims.insert("sub".to_string(), json!(opts.sub));
    claims.insert("iat".to_string(), json!(now));
    claims.insert("exp".to_string(), json!(now + opts.ttl_seconds));
    if let Some(iss) = opts.issuer {
        claims.insert("iss".to_string(), json!(iss));
    }
    if let Some(aud) = opts.audience {
        claims.insert("aud".to_string(), json!(aud));
    }

    let token = jsonwebtoken::encode(
        &Header::default(),
        &Value::Object(claims),
        &EncodingKey::from_secret(opts.secret.as_bytes()),
    )?;
    Ok(token)
}

/// Header and claims of a compact JWS, decoded without verification.
pub fn inspect(token: &str) -> Result<Value> {
    let mut segments = token.trim().split('.');
    let (Some(header), Some(claims), Some(_sig), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        bail!("not a compact JWT (expected three dot-separated segments)");
    };

    Ok(json!({
        "header": decode_segment(header).context("invalid header segment")?,
        "claims": decode_segment(claims).context("invalid claims segment")?,
    }))
}

fn decode_segment(segment: &str) -> Result<Value> {
    let bytes = URL_SAFE_NO_PAD.decode(segment)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{Algorithm, DecodingKey, Validation};

    fn opts<'a>(sub: &'a str) -> MintOptions<'a> {
        MintOptions {
            sub,
            secret: "dev-secret",
            ttl_seconds: 3600,
            issuer: Some("https://issuer.example"),
            audience: None,
        }
    }

    #[test]
    fn minted_tokens_verify_with_the_secret() {
        let now = chrono::Utc::now().timestamp();
        let token = mint(&opts("user_1"), now).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["https://issuer.example"]);
        let data = jsonwebtoken::decode::<Value>(
            &token,
            &DecodingKey::from_secret(b"dev-secret"),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims["sub"], "user_1");
        assert_eq!(data.claims["exp"], now + 3600);
    }

    #[test]
    fn empty_subject_is_refused() {
        assert!(mint(&opts(" "), 0).is_err());
    }

    #[test]
    fn inspect_shows_header_and_claims() {
        let token = mint(&opts("user_1"), 1_700_000_000).unwrap();
        let decoded = inspect(&token).unwrap();

        assert_eq!(decoded["header"]["alg"], "HS256");
        assert_eq!(decoded["claims"]["sub"], "user_1");
        assert_eq!(decoded["claims"]["iss"], "https://issuer.example");
    }

    #[test]
    fn inspect_rejects_garbage() {
        assert!(inspect("garbage").is_err());
        assert!(inspect("a.b.c.d").is_err());
        assert!(inspect("!!.??.sig").is_err());
    }
}
