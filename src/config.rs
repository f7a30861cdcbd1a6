//! Runtime limits and timeouts for a session.

use std::time::Duration;

/// Defensive ceilings and the default inactivity timeout for a `Session`.
///
/// `max_frame_payload` and `max_message_size` are not part of RFC 6455 —
/// they exist so a hostile or buggy peer can't force unbounded allocation
/// via a claimed 64-bit frame length or an unbounded fragmented message.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_frame_payload: u64,
    pub max_message_size: u64,
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_frame_payload: 16 * 1024 * 1024,
            max_message_size: 64 * 1024 * 1024,
            idle_timeout: None,
        }
    }
}
