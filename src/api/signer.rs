use crate::error::BotError;
use crate::Result;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const API_KEY_HEADER: &str = "X-AUTH-APIKEY";
pub const SIGNATURE_HEADER: &str = "X-AUTH-SIGNATURE";

/// HMAC-SHA256 of `payload` keyed with `secret`, hex encoded
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BotError::Signing(e.to_string()))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// A request body serialized once, together with the signature over those bytes
#[derive(Debug, Clone)]
pub struct SignedBody {
    pub payload: Vec<u8>,
    pub signature: String,
}

/// Holds the credentials for authenticated endpoints
#[derive(Clone)]
pub struct RequestSigner {
    api_key: String,
    api_secret: String,
}

impl RequestSigner {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Serialize `body` to compact JSON and sign the exact bytes.
    ///
    /// The returned payload is what must go on the wire; re-serializing would
    /// risk a different byte sequence and an invalid signature.
    pub fn sign<T: Serialize>(&self, body: &T) -> Result<SignedBody> {
        let payload = serde_json::to_vec(body)?;
        let signature = sign_payload(&self.api_secret, &payload)?;
        Ok(SignedBody { payload, signature })
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
