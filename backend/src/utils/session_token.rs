//! Signed cookie tokens that carry an opaque session id.
//!
//! The cookie never holds session data itself; it only names a row in the
//! server-side session store and proves the name was issued by us.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::SessionId;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn create_session_token(
    session_id: SessionId,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    secret: &str,
) -> anyhow::Result<String> {
    let claims = SessionClaims {
        sid: session_id.to_string(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(token)
}

/// Returns the session id named by a valid token that is unexpired at `now`.
///
/// Expiry is checked against the caller's clock rather than the system time
/// so the cookie and the session store agree on what "now" is.
pub fn verify_session_token(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<SessionId> {
    let mut validation = Validation::default();
    validation.validate_exp = false;
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;
    if token_data.claims.exp <= now.timestamp() {
        anyhow::bail!("session token expired");
    }
    let session_id = token_data.claims.sid.parse::<SessionId>()?;
    Ok(session_id)
}
