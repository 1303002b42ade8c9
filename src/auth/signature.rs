//! HMAC-SHA256 signing and constant-time verification.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// How a signature is rendered on the wire.
///
/// Envelope and proxy signatures are hex, webhook signatures are base64.
/// A signature in one encoding never verifies under the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    Hex,
    Base64,
}

impl SignatureEncoding {
    fn encode(self, mac: &[u8]) -> String {
        match self {
            SignatureEncoding::Hex => hex::encode(mac),
            SignatureEncoding::Base64 => BASE64.encode(mac),
        }
    }

    fn decode(self, candidate: &str) -> Option<Vec<u8>> {
        match self {
            SignatureEncoding::Hex => hex::decode(candidate).ok(),
            SignatureEncoding::Base64 => BASE64.decode(candidate).ok(),
        }
    }
}

fn keyed(secret: &[u8], message: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    mac
}

/// Compute the HMAC-SHA256 of `message` under `secret`, rendered in `encoding`.
pub fn sign(secret: &[u8], message: &[u8], encoding: SignatureEncoding) -> String {
    encoding.encode(&keyed(secret, message).finalize().into_bytes())
}

/// Check `candidate` against the expected signature of `message`.
///
/// The candidate is decoded in `encoding` and the raw MAC bytes are compared
/// in constant time. Candidates that fail to decode, or decode to the wrong
/// length, are rejected before any content comparison.
pub fn verify(secret: &[u8], message: &[u8], candidate: &str, encoding: SignatureEncoding) -> bool {
    let Some(candidate) = encoding.decode(candidate) else {
        return false;
    };
    keyed(secret, message).verify_slice(&candidate).is_ok()
}

/// Generate a random shared secret (32 bytes, hex-encoded).
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
