//! Slack request signing.
//!
//! Every webhook request carries `X-Slack-Request-Timestamp` and
//! `X-Slack-Signature`. The signature is
//! `v0={HMAC-SHA256(signing_secret, "v0:{timestamp}:{body}")}` in lowercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::Error;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Requests older (or newer) than this are rejected as replays.
pub const MAX_CLOCK_SKEW_SECS: i64 = 60 * 5;

fn mac_for(signing_secret: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, Error> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|e| Error::Signature(format!("invalid signing secret: {}", e)))?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

/// Computes the `v0=` signature Slack would send for this body.
pub fn compute_signature(signing_secret: &str, timestamp: &str, body: &[u8]) -> Result<String, Error> {
    let mac = mac_for(signing_secret, timestamp, body)?;
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

/// Checks a request's timestamp window and signature. `now` is unix seconds.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now: i64,
) -> Result<(), Error> {
    let sent_at: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| Error::Signature(format!("invalid request timestamp '{}'", timestamp)))?;

    if (now - sent_at).abs() > MAX_CLOCK_SKEW_SECS {
        return Err(Error::Signature(format!(
            "request timestamp {} is outside the allowed window",
            sent_at
        )));
    }

    let provided = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or_else(|| Error::Signature("malformed signature header".to_string()))?;

    mac_for(signing_secret, timestamp, body)?
        .verify_slice(&provided)
        .map_err(|_| Error::Signature("signature mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "8f742231b10e8888abcd99yez";
    const TIMESTAMP: &str = "1531420618";
    const BODY: &[u8] = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J";

    #[test]
    fn computed_signature_verifies() {
        let sig = compute_signature(SECRET, TIMESTAMP, BODY).unwrap();
        assert!(sig.starts_with("v0="));
        assert_eq!(sig.len(), 3 + 64);
        assert!(verify_signature(SECRET, TIMESTAMP, BODY, &sig, 1531420618).is_ok());
    }

    #[test]
    fn matches_slack_documentation_example() {
        // Example request from Slack's "Verifying requests" guide.
        let secret = "8f742231b10e8888abcd99yyyzzz85a5";
        let timestamp = "1531420618";
        let body = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
        assert_eq!(
            compute_signature(secret, timestamp, body).unwrap(),
            "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503"
        );
    }

    #[test]
    fn tampered_body_or_bad_signature_fails() {
        let sig = compute_signature(SECRET, TIMESTAMP, BODY).unwrap();
        assert!(verify_signature(SECRET, TIMESTAMP, b"tampered body", &sig, 1531420618).is_err());
        assert!(verify_signature(SECRET, TIMESTAMP, BODY, "v0=bad", 1531420618).is_err());
        assert!(verify_signature(SECRET, TIMESTAMP, BODY, "deadbeef", 1531420618).is_err());
        assert!(verify_signature("other-secret", TIMESTAMP, BODY, &sig, 1531420618).is_err());
    }

    #[test]
    fn stale_or_garbled_timestamp_is_rejected() {
        let sig = compute_signature(SECRET, TIMESTAMP, BODY).unwrap();
        let err = verify_signature(SECRET, TIMESTAMP, BODY, &sig, 1531420618 + 301).unwrap_err();
        assert!(err.to_string().contains("outside the allowed window"));
        assert!(verify_signature(SECRET, TIMESTAMP, BODY, &sig, 1531420618 + 299).is_ok());
        assert!(verify_signature(SECRET, "yesterday", BODY, &sig, 1531420618).is_err());
    }
}
