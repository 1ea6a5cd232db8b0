use crate::models;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JwtClaims {
    pub sub: String,
    pub role: String,
    pub email: String,
    pub exp: i64,
}

#[derive(Deserialize)]
struct JwtHeader {
    alg: String,
}

fn mac(secret: &[u8]) -> Result<Hmac<Sha256>, String> {
    Hmac::<Sha256>::new_from_slice(secret).map_err(|err| {
        tracing::error!("error generating hmac {err:?}");
        "invalid secret".to_string()
    })
}

/// Checks the HS256 signature of `token` and returns its claims. Expiration is checked
/// separately by `validate_jwt_expiration`.
pub fn verify_jwt(token: &str, secret: &[u8]) -> Result<JwtClaims, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid JWT format: expected 3 parts (header.payload.signature)".to_string());
    }

    let header = URL_SAFE_NO_PAD
        .decode(parts[0])
        .map_err(|e| format!("Failed to decode JWT header: {}", e))?;
    let header: JwtHeader = serde_json::from_slice(&header)
        .map_err(|e| format!("Failed to parse JWT header: {}", e))?;
    if header.alg != "HS256" {
        return Err(format!("Unsupported JWT algorithm {}", header.alg));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|e| format!("Failed to decode JWT signature: {}", e))?;
    let mut mac = mac(secret)?;
    mac.update(parts[0].as_bytes());
    mac.update(b".");
    mac.update(parts[1].as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| "JWT signature mismatch".to_string())?;

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| format!("Failed to decode JWT payload: {}", e))?;

    serde_json::from_slice(&payload).map_err(|e| format!("Failed to parse JWT claims: {}", e))
}

/// Signs `claims` with HS256.
pub fn encode_jwt(claims: &JwtClaims, secret: &[u8]) -> Result<String, String> {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::to_vec(claims).map_err(|e| format!("Failed to encode claims: {}", e))?;
    let payload = URL_SAFE_NO_PAD.encode(payload);

    let mut mac = mac(secret)?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}.{}", header, payload, signature))
}

pub fn validate_jwt_expiration(claims: &JwtClaims) -> Result<(), String> {
    let now = chrono::Utc::now().timestamp();
    if claims.exp < now {
        return Err(format!(
            "JWT token expired (exp: {}, now: {})",
            claims.exp, now
        ));
    }
    Ok(())
}

pub fn user_from_jwt_claims(claims: &JwtClaims) -> models::User {
    models::User {
        id: claims.sub.clone(),
        role: claims.role.clone(),
        email: claims.email.clone(),
    }
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(authorization: &str) -> Result<&str, String> {
    let parts: Vec<&str> = authorization.split_whitespace().collect();
    if parts.len() != 2 {
        return Err("Invalid Authorization header format".to_string());
    }
    if parts[0] != "Bearer" {
        return Err("Expected Bearer scheme in Authorization header".to_string());
    }
    Ok(parts[1])
}
