//! JWT Token Generation and Validation
//!
//! Tokens are signed with EdDSA (Ed25519). The gate only needs the public key
//! to validate tokens issued by the storefront's auth service; signing is
//! available for tooling and tests.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::error::{AuthError, AuthResult};

/// JWT claims for access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (customer or admin user ID).
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Kind of actor the token was issued to.
    pub actor_type: ActorType,
}

/// Actor discriminator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    /// Storefront customer.
    Customer,
    /// Admin user.
    User,
}

/// Decode a base64-encoded PEM key.
fn decode_pem_key(base64_key: &str) -> AuthResult<Vec<u8>> {
    STANDARD
        .decode(base64_key)
        .map_err(|_| AuthError::Internal("Invalid base64 in JWT key".to_string()))
}

/// Generate an access token.
///
/// # Arguments
/// * `actor_id` - Customer or admin user ID
/// * `actor_type` - Kind of actor
/// * `private_key` - Ed25519 private key (PEM format, base64-encoded)
/// * `expiry_seconds` - Token validity
pub fn generate_access_token(
    actor_id: &str,
    actor_type: ActorType,
    private_key: &str,
    expiry_seconds: i64,
) -> AuthResult<String> {
    let now = Utc::now();

    let key_bytes = decode_pem_key(private_key)?;
    let encoding_key = EncodingKey::from_ed_pem(&key_bytes)
        .map_err(|e| AuthError::Internal(format!("Invalid Ed25519 private key: {e}")))?;

    let claims = Claims {
        sub: actor_id.to_string(),
        exp: (now + Duration::seconds(expiry_seconds)).timestamp(),
        iat: now.timestamp(),
        actor_type,
    };

    Ok(encode(&Header::new(Algorithm::EdDSA), &claims, &encoding_key)?)
}

/// Validate and decode an access token.
///
/// Returns an error if the token is invalid or expired.
pub fn validate_access_token(token: &str, public_key: &str) -> AuthResult<Claims> {
    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.validate_exp = true;
    validation.leeway = 0;

    let key_bytes = decode_pem_key(public_key)?;
    let decoding_key = DecodingKey::from_ed_pem(&key_bytes)
        .map_err(|e| AuthError::Internal(format!("Invalid Ed25519 public key: {e}")))?;

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind()
    {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    if token_data.claims.sub.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    Ok(token_data.claims)
}
