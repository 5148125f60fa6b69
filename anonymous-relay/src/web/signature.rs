//! Slack request signature verification.
//!
//! Slack signs every request with HMAC-SHA256 over `v0:{timestamp}:{body}`
//! and sends the result as `X-Slack-Signature: v0=<hex>` alongside
//! `X-Slack-Request-Timestamp`.
//! Reference: https://api.slack.com/authentication/verifying-requests-from-slack

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

/// Version tag prefixed to both the base string and the signature.
pub const SIGNATURE_VERSION: &str = "v0";

/// Maximum distance in seconds between the request timestamp and now.
pub const MAX_TIMESTAMP_AGE_SECS: u64 = 300;

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("missing signature headers")]
    MissingHeader,

    #[error("stale request timestamp")]
    StaleTimestamp,

    #[error("signature mismatch")]
    SignatureMismatch,
}

/// Outcome of verifying one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResult {
    Accepted,
    Rejected(RejectReason),
}

impl VerificationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationResult::Accepted)
    }
}

/// Verify a Slack request.
///
/// The timestamp window is checked before any HMAC work, so a stale request
/// is rejected as [`RejectReason::StaleTimestamp`] whether or not its
/// signature is correct. `raw_body` must be the exact bytes received.
///
/// # Arguments
///
/// * `headers` - Request headers (lookup is case-insensitive)
/// * `raw_body` - Form-encoded body exactly as sent by Slack
/// * `signing_secret` - The app's signing secret
/// * `now` - Current Unix epoch seconds
pub fn verify(
    headers: &HeaderMap,
    raw_body: &[u8],
    signing_secret: &str,
    now: u64,
) -> VerificationResult {
    let signature = header_str(headers, SIGNATURE_HEADER);
    let timestamp = header_str(headers, TIMESTAMP_HEADER);

    let (signature, timestamp) = match (signature, timestamp) {
        (Some(sig), Some(ts)) => (sig, ts),
        (sig, ts) => {
            warn!(
                has_signature = sig.is_some(),
                has_timestamp = ts.is_some(),
                "slack_signature_missing_headers"
            );
            return VerificationResult::Rejected(RejectReason::MissingHeader);
        }
    };

    let request_time: u64 = match timestamp.trim().parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(timestamp = %timestamp, "slack_signature_invalid_timestamp");
            return VerificationResult::Rejected(RejectReason::StaleTimestamp);
        }
    };

    let age = now.abs_diff(request_time);
    if age > MAX_TIMESTAMP_AGE_SECS {
        warn!(
            request_time = request_time,
            current_time = now,
            age_seconds = age,
            max_age_seconds = MAX_TIMESTAMP_AGE_SECS,
            "slack_signature_stale"
        );
        return VerificationResult::Rejected(RejectReason::StaleTimestamp);
    }

    let expected = match compute_signature(signing_secret, timestamp, raw_body) {
        Some(sig) => sig,
        None => {
            warn!("slack_signature_invalid_key");
            return VerificationResult::Rejected(RejectReason::SignatureMismatch);
        }
    };

    // ct_eq on slices yields false for unequal lengths without comparing bytes
    let valid: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = signature.len(),
            "slack_signature_mismatch"
        );
        return VerificationResult::Rejected(RejectReason::SignatureMismatch);
    }

    debug!("slack_signature_verified");
    VerificationResult::Accepted
}

/// Verify against the system clock.
pub fn verify_now(
    headers: &HeaderMap,
    raw_body: &[u8],
    signing_secret: &str,
) -> VerificationResult {
    verify(headers, raw_body, signing_secret, unix_now())
}

/// Compute `v0=<hex>` for the given timestamp and body.
pub fn compute_signature(
    signing_secret: &str,
    timestamp: &str,
    raw_body: &[u8],
) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes()).ok()?;

    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(raw_body);

    Some(format!(
        "{}={}",
        SIGNATURE_VERSION,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Current Unix epoch seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "shhh";
    const BODY: &[u8] = b"channel_id=C123&text=hello&command=%2Fanonymous";
    const NOW: u64 = 1_700_000_000;

    fn signed_headers(timestamp: &str, signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from_str(timestamp).unwrap());
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(signature).unwrap());
        headers
    }

    fn valid_headers(timestamp: u64) -> HeaderMap {
        let ts = timestamp.to_string();
        let sig = compute_signature(SECRET, &ts, BODY).unwrap();
        signed_headers(&ts, &sig)
    }

    #[test]
    fn test_compute_signature_known_vector() {
        // Example from Slack's request verification guide
        let secret = "8f742231b10e8888abcd99yyyzzz85a5";
        let timestamp = "1531420618";
        let body = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";

        assert_eq!(
            compute_signature(secret, timestamp, body).unwrap(),
            "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503"
        );
    }

    #[test]
    fn test_verify_valid() {
        let headers = valid_headers(NOW);
        assert_eq!(verify(&headers, BODY, SECRET, NOW), VerificationResult::Accepted);
    }

    #[test]
    fn test_verify_within_window_both_directions() {
        assert!(verify(&valid_headers(NOW - 300), BODY, SECRET, NOW).is_accepted());
        assert!(verify(&valid_headers(NOW + 300), BODY, SECRET, NOW).is_accepted());
    }

    #[test]
    fn test_verify_stale_regardless_of_signature() {
        for ts in [NOW - 301, NOW + 301, NOW - 400, 946_684_800] {
            let headers = valid_headers(ts);
            assert_eq!(
                verify(&headers, BODY, SECRET, NOW),
                VerificationResult::Rejected(RejectReason::StaleTimestamp)
            );
        }

        let headers = signed_headers(&(NOW - 400).to_string(), "v0=deadbeef");
        assert_eq!(
            verify(&headers, BODY, SECRET, NOW),
            VerificationResult::Rejected(RejectReason::StaleTimestamp)
        );
    }

    #[test]
    fn test_verify_unparseable_timestamp() {
        let headers = signed_headers("not-a-number", "v0=deadbeef");
        assert_eq!(
            verify(&headers, BODY, SECRET, NOW),
            VerificationResult::Rejected(RejectReason::StaleTimestamp)
        );
    }

    #[test]
    fn test_verify_missing_headers() {
        let full = valid_headers(NOW);

        let mut no_sig = full.clone();
        no_sig.remove(SIGNATURE_HEADER);
        assert_eq!(
            verify(&no_sig, BODY, SECRET, NOW),
            VerificationResult::Rejected(RejectReason::MissingHeader)
        );

        let mut no_ts = full.clone();
        no_ts.remove(TIMESTAMP_HEADER);
        assert_eq!(
            verify(&no_ts, BODY, SECRET, NOW),
            VerificationResult::Rejected(RejectReason::MissingHeader)
        );

        assert_eq!(
            verify(&HeaderMap::new(), BODY, SECRET, NOW),
            VerificationResult::Rejected(RejectReason::MissingHeader)
        );
    }

    #[test]
    fn test_verify_header_lookup_is_case_insensitive() {
        let ts = NOW.to_string();
        let sig = compute_signature(SECRET, &ts, BODY).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-slack-request-timestamp", HeaderValue::from_str(&ts).unwrap());
        headers.insert("x-slack-signature", HeaderValue::from_str(&sig).unwrap());

        assert!(verify(&headers, BODY, SECRET, NOW).is_accepted());
    }

    #[test]
    fn test_verify_every_single_bit_flip_is_rejected() {
        let ts = NOW.to_string();
        let sig = compute_signature(SECRET, &ts, BODY).unwrap();

        for i in 0..sig.len() {
            for bit in 0..7u8 {
                let mut bytes = sig.clone().into_bytes();
                bytes[i] ^= 1 << bit;
                // Header values must be visible ASCII
                let Ok(flipped) = String::from_utf8(bytes) else {
                    continue;
                };
                let Ok(value) = HeaderValue::from_str(&flipped) else {
                    continue;
                };

                let mut headers = HeaderMap::new();
                headers.insert(TIMESTAMP_HEADER, HeaderValue::from_str(&ts).unwrap());
                headers.insert(SIGNATURE_HEADER, value);

                assert_eq!(
                    verify(&headers, BODY, SECRET, NOW),
                    VerificationResult::Rejected(RejectReason::SignatureMismatch),
                    "flip at byte {} bit {}",
                    i,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_verify_truncated_signature() {
        let ts = NOW.to_string();
        let sig = compute_signature(SECRET, &ts, BODY).unwrap();
        let headers = signed_headers(&ts, &sig[..sig.len() - 1]);

        assert_eq!(
            verify(&headers, BODY, SECRET, NOW),
            VerificationResult::Rejected(RejectReason::SignatureMismatch)
        );
    }

    #[test]
    fn test_verify_wrong_secret() {
        let headers = valid_headers(NOW);
        assert_eq!(
            verify(&headers, BODY, "other-secret", NOW),
            VerificationResult::Rejected(RejectReason::SignatureMismatch)
        );
    }

    #[test]
    fn test_verify_reencoded_body_does_not_match() {
        let headers = valid_headers(NOW);
        // Same fields, different encoding of the slash
        let reencoded = b"channel_id=C123&text=hello&command=/anonymous";

        assert_eq!(
            verify(&headers, reencoded, SECRET, NOW),
            VerificationResult::Rejected(RejectReason::SignatureMismatch)
        );
    }

    #[test]
    fn test_verify_is_idempotent() {
        let headers = valid_headers(NOW);
        let first = verify(&headers, BODY, SECRET, NOW);
        let second = verify(&headers, BODY, SECRET, NOW);
        assert_eq!(first, second);

        let stale = valid_headers(NOW - 1000);
        assert_eq!(
            verify(&stale, BODY, SECRET, NOW),
            verify(&stale, BODY, SECRET, NOW)
        );
    }

    #[test]
    fn test_reject_reason_text() {
        assert_eq!(RejectReason::MissingHeader.to_string(), "missing signature headers");
        assert_eq!(RejectReason::StaleTimestamp.to_string(), "stale request timestamp");
        assert_eq!(RejectReason::SignatureMismatch.to_string(), "signature mismatch");
    }
}
