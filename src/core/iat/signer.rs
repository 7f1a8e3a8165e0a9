//! Request signing for the IAT WebSocket handshake.
//!
//! The service authenticates the connection URL itself: an HMAC-SHA256
//! signature over `host`, `date` and the request line, wrapped in a
//! base64-encoded authorization value and appended as query parameters.
//! Signatures are time-boxed — the service rejects dates that drift too far
//! from its own clock — so a handshake is produced immediately before
//! connecting and never cached across attempts.

use std::time::{Duration, SystemTime};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::errors::{SpeechError, SpeechResult};

type HmacSha256 = Hmac<Sha256>;

/// How long a signed URL stays connectable. The service tolerates roughly
/// five minutes of clock skew on the signed date.
pub const HANDSHAKE_TTL: Duration = Duration::from_secs(300);

/// The credential triple loaded once at startup.
///
/// Read-only for the process lifetime; safe to share across concurrently
/// running sessions.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub app_id: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Signed connection material for exactly one recognition attempt.
///
/// Discarded after the attempt, successful or not.
#[derive(Debug, Clone)]
pub struct SessionHandshake {
    url: String,
    expires_at: SystemTime,
}

impl SessionHandshake {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

/// The current time as an RFC 1123 HTTP date, the format the service signs
/// against.
pub fn http_date_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Sign a connection URL for `wss://{host}{path}`.
///
/// Pure function of its inputs: fixed credentials, host, path and date
/// produce a byte-identical URL. Fails only when secret material is missing.
pub fn sign(
    credentials: &Credentials,
    host: &str,
    path: &str,
    date: &str,
) -> SpeechResult<SessionHandshake> {
    if credentials.api_key.is_empty() || credentials.api_secret.is_empty() {
        return Err(SpeechError::Signing(
            "api key and secret are required".to_string(),
        ));
    }

    let signature_origin = format!("host: {host}\ndate: {date}\nGET {path} HTTP/1.1");

    let mut mac = HmacSha256::new_from_slice(credentials.api_secret.as_bytes())
        .map_err(|e| SpeechError::Signing(format!("invalid signing key: {e}")))?;
    mac.update(signature_origin.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    let authorization_origin = format!(
        "api_key=\"{}\", algorithm=\"hmac-sha256\", headers=\"host date request-line\", signature=\"{}\"",
        credentials.api_key, signature
    );
    let authorization = BASE64.encode(authorization_origin.as_bytes());

    let mut url = Url::parse(&format!("wss://{host}{path}"))
        .map_err(|e| SpeechError::Signing(format!("invalid endpoint url: {e}")))?;
    url.query_pairs_mut()
        .append_pair("authorization", &authorization)
        .append_pair("date", date)
        .append_pair("host", host);

    Ok(SessionHandshake {
        url: url.to_string(),
        expires_at: SystemTime::now() + HANDSHAKE_TTL,
    })
}
