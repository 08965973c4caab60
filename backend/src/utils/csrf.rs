use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

/// Token length in bytes before hex encoding (256 bits).
pub const CSRF_TOKEN_BYTES: usize = 32;

pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time comparison; differing lengths fail without leaking where.
pub fn tokens_match(expected: &str, candidate: &str) -> bool {
    bool::from(expected.as_bytes().ct_eq(candidate.as_bytes()))
}
