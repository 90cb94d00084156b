//! Shared-secret authorization for scheduled and admin triggers.

use crate::{Error, Result};

const BEARER_PREFIX: &str = "Bearer ";

/// Check an `Authorization` header against a configured secret.
///
/// With no secret configured every request is allowed. Otherwise the header
/// must be exactly `Bearer <secret>`.
///
/// # Errors
///
/// Returns `Error::Unauthorized` if the header is missing or wrong.
pub fn authorize_bearer(expected: Option<&str>, header: Option<&str>) -> Result<()> {
    let Some(secret) = expected else {
        return Ok(());
    };

    let token = header
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .ok_or(Error::Unauthorized)?;

    if constant_time_eq(token.as_bytes(), secret.as_bytes()) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

/// Byte comparison whose running time does not depend on where the inputs
/// differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
