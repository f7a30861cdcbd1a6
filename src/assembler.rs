//! Collapses a sequence of decoded frames into application-level events.
//!
//! Fragmentation, ping/pong auto-reply bookkeeping and close-payload
//! decoding all live here; the decoder only ever hands this module one
//! frame at a time and knows nothing about message boundaries.

use crate::config::SessionConfig;
use crate::error::ProtocolError;
use crate::frame::{OpCode, RawFrame};
use crate::message::Message;

/// What the assembler produces for a given frame.
#[derive(Debug, Clone)]
pub enum AssembledEvent {
    /// A complete application message, ready for `Handler::on_message`.
    Message(Message),
    /// A close frame arrived; carries the decoded status/reason if present.
    Close {
        status: Option<u16>,
        reason: Vec<u8>,
    },
    /// Nothing to dispatch yet; more fragments are still coming.
    Pending,
}

#[derive(Debug)]
enum FragState {
    None,
    Assembling { opcode: OpCode, buf: Vec<u8> },
}

#[derive(Debug)]
pub struct MessageAssembler {
    state: FragState,
}

impl Default for MessageAssembler {
    fn default() -> Self {
        MessageAssembler { state: FragState::None }
    }
}

impl MessageAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        frame: RawFrame,
        config: &SessionConfig,
    ) -> Result<AssembledEvent, ProtocolError> {
        match frame.opcode {
            OpCode::Close => {
                let (status, reason) = decode_close_payload(&frame.payload);
                return Ok(AssembledEvent::Close { status, reason });
            }
            OpCode::Ping => return Ok(AssembledEvent::Message(Message::Ping(frame.payload))),
            OpCode::Pong => return Ok(AssembledEvent::Message(Message::Pong(frame.payload))),
            _ => {}
        }

        match &mut self.state {
            FragState::None => match frame.opcode {
                OpCode::Continuation => Err(ProtocolError::UnexpectedContinuation),
                OpCode::Text | OpCode::Binary => {
                    if frame.fin {
                        Ok(AssembledEvent::Message(to_message(frame.opcode, frame.payload)))
                    } else {
                        let len = frame.payload.len() as u64;
                        if len > config.max_message_size {
                            return Err(ProtocolError::MessageTooLarge {
                                len,
                                max: config.max_message_size,
                            });
                        }
                        self.state = FragState::Assembling {
                            opcode: frame.opcode,
                            buf: frame.payload,
                        };
                        Ok(AssembledEvent::Pending)
                    }
                }
                OpCode::Close | OpCode::Ping | OpCode::Pong => unreachable!("handled above"),
            },
            FragState::Assembling { opcode, buf } => match frame.opcode {
                OpCode::Continuation => {
                    let new_len = buf.len() as u64 + frame.payload.len() as u64;
                    if new_len > config.max_message_size {
                        return Err(ProtocolError::MessageTooLarge {
                            len: new_len,
                            max: config.max_message_size,
                        });
                    }
                    buf.extend_from_slice(&frame.payload);
                    if frame.fin {
                        let opcode = *opcode;
                        let FragState::Assembling { buf, .. } =
                            std::mem::replace(&mut self.state, FragState::None)
                        else {
                            unreachable!()
                        };
                        Ok(AssembledEvent::Message(to_message(opcode, buf)))
                    } else {
                        Ok(AssembledEvent::Pending)
                    }
                }
                OpCode::Text | OpCode::Binary => Err(ProtocolError::NestedFragmentation),
                OpCode::Close | OpCode::Ping | OpCode::Pong => unreachable!("handled above"),
            },
        }
    }
}

fn to_message(opcode: OpCode, payload: Vec<u8>) -> Message {
    match opcode {
        OpCode::Text => Message::Text(String::from_utf8_lossy(&payload).into_owned()),
        OpCode::Binary => Message::Binary(payload),
        _ => unreachable!("only Text/Binary ever accumulate a fragmented message"),
    }
}

/// Decode a close frame's optional `status:16 ++ reason` payload.
///
/// A zero- or one-byte payload degrades to `(None, payload)` rather than
/// being treated as malformed — the wire format doesn't require a status
/// code at all.
fn decode_close_payload(payload: &[u8]) -> (Option<u16>, Vec<u8>) {
    if payload.len() < 2 {
        return (None, payload.to_vec());
    }
    let status = u16::from_be_bytes([payload[0], payload[1]]);
    (Some(status), payload[2..].to_vec())
}
