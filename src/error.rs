//! Error taxonomy for the session core.
//!
//! `ProtocolError` covers every malformed-frame cause from the decoder and
//! assembler. `HandshakeError` is deliberately never surfaced through
//! `TerminateReason`: a rejected upgrade is a successful outcome (a 400
//! response gets sent), not a failure the caller needs to unwrap. Every
//! other runtime failure (transport I/O, a decoded protocol violation, a
//! panicking handler) is reported by stringifying it into the matching
//! `TerminateReason` variant, so there is no separate top-level error type
//! for the session loop itself.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("reserved bits must be zero")]
    ReservedBitsSet,
    #[error("client frames must be masked")]
    MissingMask,
    #[error("unknown opcode {0:#x}")]
    UnknownOpCode(u8),
    #[error("control frame payload of {0} bytes exceeds the 125 byte limit")]
    ControlFrameTooLarge(u64),
    #[error("control frames must not be fragmented")]
    FragmentedControlFrame,
    #[error("continuation frame received with no fragmented message in progress")]
    UnexpectedContinuation,
    #[error("data frame received while a fragmented message is already in progress")]
    NestedFragmentation,
    #[error("frame payload of {len} bytes exceeds the configured max of {max} bytes")]
    FrameTooLarge { len: u64, max: u64 },
    #[error("assembled message of {len} bytes exceeds the configured max of {max} bytes")]
    MessageTooLarge { len: u64, max: u64 },
    #[error("length field encoded with a non-minimal representation")]
    OverlongLength,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("missing or invalid Connection header")]
    MissingUpgradeToken,
    #[error("missing or invalid Upgrade header")]
    InvalidUpgradeHeader,
    #[error("missing or unsupported Sec-WebSocket-Version (expected 7, 8 or 13)")]
    UnsupportedVersion,
    #[error("missing or empty Sec-WebSocket-Key")]
    MissingKey,
    #[error("handler rejected the upgrade")]
    RejectedByHandler,
}
