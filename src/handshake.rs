//! Upgrade-request validation and `Sec-WebSocket-Accept` computation.

use crate::error::HandshakeError;
use crate::request::HttpRequest;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};

const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Validate the headers of `request` against RFC 6455 §4.2.1, returning the
/// `Sec-WebSocket-Key` on success.
pub fn validate_upgrade<'a>(request: &'a HttpRequest) -> Result<&'a str, HandshakeError> {
    let connection = request
        .header("connection")
        .ok_or(HandshakeError::MissingUpgradeToken)?;
    if !connection
        .split(',')
        .any(|tok| tok.trim().eq_ignore_ascii_case("upgrade"))
    {
        return Err(HandshakeError::MissingUpgradeToken);
    }

    let upgrade = request
        .header("upgrade")
        .ok_or(HandshakeError::InvalidUpgradeHeader)?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(HandshakeError::InvalidUpgradeHeader);
    }

    let version = request
        .header("sec-websocket-version")
        .ok_or(HandshakeError::UnsupportedVersion)?;
    match version.trim().parse::<u32>() {
        Ok(7) | Ok(8) | Ok(13) => {}
        _ => return Err(HandshakeError::UnsupportedVersion),
    }

    let key = request
        .header("sec-websocket-key")
        .ok_or(HandshakeError::MissingKey)?;
    if key.is_empty() {
        return Err(HandshakeError::MissingKey);
    }

    Ok(key)
}

/// `base64(SHA1(key ++ GUID))`, byte-wise concatenation with no key
/// normalization.
pub fn accept_token(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    let digest = hasher.finalize();
    STANDARD.encode(digest)
}

/// Render the 101 Switching Protocols response line and headers.
pub fn accept_response(key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        accept_token(key)
    )
}

/// The fixed 400 response sent when a handshake fails validation or the
/// handler declines the upgrade.
pub const REJECTION_RESPONSE: &str = "HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n";
