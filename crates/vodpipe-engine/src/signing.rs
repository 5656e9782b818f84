//! HMAC signing of completion callbacks.
//!
//! The engine signs each callback body with HMAC-SHA256 using the credential
//! handed over at endpoint creation; the webhook stage verifies it before
//! trusting the payload. The key is 64 random bytes, configured
//! base64-encoded.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{EngineError, EngineResult};

type HmacSha256 = Hmac<Sha256>;

/// Required raw key length in bytes.
pub const SIGNING_KEY_LEN: usize = 64;

/// Signer/verifier for notification callback bodies.
#[derive(Clone, Debug)]
pub struct CallbackSigner {
    key: Vec<u8>,
}

impl CallbackSigner {
    /// Build a signer from a base64-encoded key, validating its shape.
    pub fn from_base64(encoded: &str) -> EngineResult<Self> {
        let key = STANDARD.decode(encoded.trim()).map_err(|e| {
            EngineError::config_error(format!("signing key is not valid base64: {}", e))
        })?;

        if key.len() != SIGNING_KEY_LEN {
            return Err(EngineError::config_error(format!(
                "signing key must be {} bytes, got {}",
                SIGNING_KEY_LEN,
                key.len()
            )));
        }

        Ok(Self { key })
    }

    /// Base64 form of the key, as handed to the engine on endpoint creation.
    pub fn credential_base64(&self) -> String {
        STANDARD.encode(&self.key)
    }

    /// Compute the base64 HMAC-SHA256 signature of a callback body.
    pub fn signature(&self, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(body);
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Verify a callback body against its claimed signature.
    pub fn verify(&self, body: &[u8], signature_base64: &str) -> bool {
        let claimed = match STANDARD.decode(signature_base64) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(body);
        mac.verify_slice(&claimed).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key_base64() -> String {
        STANDARD.encode(vec![7u8; SIGNING_KEY_LEN])
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let signer = CallbackSigner::from_base64(&test_key_base64()).expect("valid key");
        let body = br#"{"jobId":"job-1","state":"Finished"}"#;

        let sig = signer.signature(body);
        assert!(signer.verify(body, &sig));
        assert!(!signer.verify(b"tampered", &sig));
    }

    #[test]
    fn rejects_non_base64_key() {
        let err = CallbackSigner::from_base64("!!!not base64!!!").unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));
    }

    #[test]
    fn rejects_short_key() {
        let short = STANDARD.encode(vec![1u8; 16]);
        let err = CallbackSigner::from_base64(&short).unwrap_err();
        assert!(err.to_string().contains("64 bytes"));
    }

    #[test]
    fn credential_roundtrips_the_key() {
        let encoded = test_key_base64();
        let signer = CallbackSigner::from_base64(&encoded).expect("valid key");
        assert_eq!(signer.credential_base64(), encoded);
    }
}
