//! Bearer tokens guarding the invocation endpoints

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::errors::ControllerError;

const BEARER_PREFIX: &str = "Bearer ";

/// Message both sides MAC so tokens are compared as fixed-length tags
const TOKEN_CONTEXT: &[u8] = b"pipewright-invoke";

/// `Authorization` header value for a token
pub fn bearer_value(token: &SecretString) -> SecretString {
    SecretString::from(format!("{}{}", BEARER_PREFIX, token.expose_secret()))
}

/// Token carried by an `Authorization: Bearer <token>` header
pub fn parse_bearer(header: &str) -> Option<&str> {
    header
        .trim()
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn token_tag(token: &[u8]) -> Result<Hmac<Sha256>, ControllerError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(token)
        .map_err(|e| ControllerError::SignatureError(format!("Invalid token: {}", e)))?;
    mac.update(TOKEN_CONTEXT);
    Ok(mac)
}

/// Check a presented token against the expected one in constant time
pub fn verify_token(expected: &[u8], presented: &[u8]) -> Result<(), ControllerError> {
    if expected.is_empty() {
        return Err(ControllerError::SignatureError("Invocation token is empty".into()));
    }

    let presented = token_tag(presented)?.finalize().into_bytes();
    token_tag(expected)?
        .verify_slice(&presented)
        .map_err(|_| ControllerError::SignatureError("Invocation token mismatch".into()))
}
