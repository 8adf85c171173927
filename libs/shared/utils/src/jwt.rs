use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use tracing::debug;

use shared_models::auth::JwtClaims;

// Browsers' `atob` tolerates non-zero trailing bits, so the codec does too.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Decodes the payload segment of a compact token.
///
/// The signature is not checked; the server remains the authority on token
/// validity and expiry. Any structural problem yields `None`.
pub fn decode_token(token: &str) -> Option<JwtClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        debug!("Invalid token format: expected 3 segments, got {}", parts.len());
        return None;
    }

    let payload = normalize_segment(parts[1]);

    let bytes = match PAYLOAD_ENGINE.decode(payload.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Failed to decode token payload: {}", e);
            return None;
        }
    };

    match serde_json::from_slice::<JwtClaims>(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!("Failed to parse token claims: {}", e);
            None
        }
    }
}

/// Translates the URL-safe alphabet to the standard one and restores padding.
fn normalize_segment(segment: &str) -> String {
    let mut normalized: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let remainder = normalized.len() % 4;
    if remainder != 0 {
        normalized.push_str(&"=".repeat(4 - remainder));
    }

    normalized
}
