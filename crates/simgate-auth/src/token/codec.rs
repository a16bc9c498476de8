//! Unverified decoding of three-segment base64url tokens.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::debug;

use simgate_core::traits::Clock;

use super::payload::{RawClaims, TokenPayload};

/// URL-safe alphabet that accepts segments with or without `=` padding.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes token payloads and answers expiry questions against a clock.
///
/// Nothing here returns an error: an undecodable token is treated as
/// absent, and therefore as expired.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Decode the payload segment without verifying the signature.
    pub fn decode(&self, token: &str) -> Option<TokenPayload> {
        let mut segments = token.split('.');
        let (Some(_header), Some(body), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            debug!("Token rejected: expected three segments");
            return None;
        };

        let bytes = SEGMENT_ENGINE.decode(body).ok()?;
        let raw: RawClaims = serde_json::from_slice(&bytes).ok()?;
        TokenPayload::from_raw(raw)
    }

    /// Whether the token expires within `buffer_seconds` from now.
    ///
    /// Undecodable tokens are expired.
    pub fn is_expired(&self, token: &str, buffer_seconds: i64) -> bool {
        match self.decode(token) {
            Some(payload) => {
                payload.expires_at < self.clock.now().timestamp().saturating_add(buffer_seconds)
            }
            None => true,
        }
    }

    /// Time left before expiry, zero when already expired or undecodable.
    pub fn time_until_expiry(&self, token: &str) -> Duration {
        let Some(payload) = self.decode(token) else {
            return Duration::ZERO;
        };
        let remaining = payload.expires_at_millis() - self.clock.now_millis();
        Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
    }

    /// Whether the token expires in less than `minutes`.
    pub fn is_expiring_soon(&self, token: &str, minutes: i64) -> bool {
        match self.decode(token) {
            Some(payload) => {
                let remaining = payload.expires_at_millis() - self.clock.now_millis();
                remaining < minutes.saturating_mul(60_000)
            }
            None => true,
        }
    }

    /// Expiry in epoch milliseconds, when the token decodes.
    pub fn expiry_millis(&self, token: &str) -> Option<i64> {
        self.decode(token).map(|p| p.expires_at_millis())
    }

    /// The clock this codec reads.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
