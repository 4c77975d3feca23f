//! Webhook payload signatures

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::errors::ControllerError;

/// Header carrying the SHA-256 signature
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";

/// Legacy signature header
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl SignatureAlgorithm {
    fn prefix(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
            SignatureAlgorithm::Sha512 => "sha512",
        }
    }
}

impl std::str::FromStr for SignatureAlgorithm {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            "sha512" => Ok(SignatureAlgorithm::Sha512),
            _ => Err(ControllerError::SignatureError(format!(
                "Unsupported signature algorithm: {}",
                s
            ))),
        }
    }
}

/// Split `<algorithm>=<hex digest>` into its parts
pub fn parse_signature(header: &str) -> Result<(SignatureAlgorithm, Vec<u8>), ControllerError> {
    let (algorithm, digest) = header
        .trim()
        .split_once('=')
        .ok_or_else(|| ControllerError::SignatureError("Malformed signature header".into()))?;

    let algorithm = algorithm.parse()?;
    let digest = hex::decode(digest)
        .map_err(|e| ControllerError::SignatureError(format!("Invalid signature digest: {}", e)))?;
    Ok((algorithm, digest))
}

fn invalid_key<E: std::fmt::Display>(e: E) -> ControllerError {
    ControllerError::SignatureError(format!("Invalid signing key: {}", e))
}

/// Check `header` against the HMAC of `body` under `key`, in constant time
pub fn verify(key: &[u8], body: &[u8], header: &str) -> Result<(), ControllerError> {
    let (algorithm, expected) = parse_signature(header)?;

    let valid = match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(invalid_key)?;
            mac.update(body);
            mac.verify_slice(&expected).is_ok()
        }
        SignatureAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(invalid_key)?;
            mac.update(body);
            mac.verify_slice(&expected).is_ok()
        }
        SignatureAlgorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).map_err(invalid_key)?;
            mac.update(body);
            mac.verify_slice(&expected).is_ok()
        }
    };

    if valid {
        Ok(())
    } else {
        Err(ControllerError::SignatureError("Signature mismatch".into()))
    }
}

/// Sign `body` with HMAC-SHA256 in header form
pub fn sign_sha256(key: &[u8], body: &[u8]) -> Result<String, ControllerError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(invalid_key)?;
    mac.update(body);
    Ok(format!(
        "{}={}",
        SignatureAlgorithm::Sha256.prefix(),
        hex::encode(mac.finalize().into_bytes())
    ))
}
