//! Application-level view of what flows in and out of a handler.

/// What the assembler hands the handler once a complete message exists.
#[derive(Debug, Clone)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
}

/// What a handler hands back to be encoded onto the wire.
///
/// `Close` carries an optional status code and reason; either may be
/// omitted, matching the wire's own allowance for a zero-length close
/// payload.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close {
        status: Option<u16>,
        reason: String,
    },
}

impl OutboundFrame {
    pub fn close() -> Self {
        OutboundFrame::Close {
            status: None,
            reason: String::new(),
        }
    }

    pub fn close_with(status: u16, reason: impl Into<String>) -> Self {
        OutboundFrame::Close {
            status: Some(status),
            reason: reason.into(),
        }
    }
}
