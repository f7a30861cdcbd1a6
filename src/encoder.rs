//! Serializes outbound logical frames to wire bytes.
//!
//! Server frames are never masked, so this side of the protocol is
//! considerably simpler than the decoder: there's no incremental state,
//! just a length-prefix branch and a payload copy.

use crate::frame::OpCode;
use crate::message::OutboundFrame;

/// Whether encoding a frame means the connection should close after the
/// bytes are flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    Continue,
    Shutdown,
}

#[derive(Debug, Default)]
pub struct FrameEncoder;

impl FrameEncoder {
    pub fn new() -> Self {
        FrameEncoder
    }

    /// Encode `frame` into `out` and report whether the caller should
    /// terminate the connection after writing it.
    pub fn encode(&mut self, frame: &OutboundFrame, out: &mut Vec<u8>) -> EncodeOutcome {
        match frame {
            OutboundFrame::Text(s) => {
                write_frame(out, OpCode::Text, s.as_bytes());
                EncodeOutcome::Continue
            }
            OutboundFrame::Binary(b) => {
                write_frame(out, OpCode::Binary, b);
                EncodeOutcome::Continue
            }
            OutboundFrame::Ping(p) => {
                write_frame(out, OpCode::Ping, p);
                EncodeOutcome::Continue
            }
            OutboundFrame::Pong(p) => {
                write_frame(out, OpCode::Pong, p);
                EncodeOutcome::Continue
            }
            OutboundFrame::Close { status, reason } => {
                let mut payload = Vec::new();
                if let Some(code) = status {
                    payload.extend_from_slice(&code.to_be_bytes());
                    payload.extend_from_slice(reason.as_bytes());
                }
                write_frame(out, OpCode::Close, &payload);
                EncodeOutcome::Shutdown
            }
        }
    }

    /// Encode each frame in order, stopping at the first `Shutdown` and
    /// dropping anything after it.
    pub fn encode_many(&mut self, frames: &[OutboundFrame], out: &mut Vec<u8>) -> EncodeOutcome {
        for frame in frames {
            if self.encode(frame, out) == EncodeOutcome::Shutdown {
                return EncodeOutcome::Shutdown;
            }
        }
        EncodeOutcome::Continue
    }
}

fn write_frame(out: &mut Vec<u8>, opcode: OpCode, payload: &[u8]) {
    out.push(0x80 | opcode.to_u8());
    let len = payload.len();
    if len <= 125 {
        out.push(len as u8);
    } else if len <= 0xFFFF {
        out.push(126);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(127);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }
    out.extend_from_slice(payload);
}
