//! Incremental RFC 6455 frame decoding over a growable byte buffer.
//!
//! `FrameDecoder::decode` is a pure function of its buffer: it never blocks
//! and never assumes a whole frame is present. Call it in a loop after every
//! read; it returns `Ok(None)` the moment it needs more bytes than are
//! currently buffered, leaving the buffer untouched so the next read can
//! top it up.

use crate::config::SessionConfig;
use crate::error::ProtocolError;
use crate::frame::{OpCode, RawFrame};
use bytes::{Buf, BytesMut};

#[derive(Debug, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    pub fn new() -> Self {
        FrameDecoder
    }

    /// Attempt to decode exactly one frame from the front of `buf`.
    ///
    /// On `Ok(Some(frame))`, the consumed bytes are removed from `buf`.
    /// On `Ok(None)`, `buf` is untouched — more bytes are needed.
    pub fn decode(
        &mut self,
        buf: &mut BytesMut,
        config: &SessionConfig,
    ) -> Result<Option<RawFrame>, ProtocolError> {
        if buf.len() < 2 {
            return Ok(None);
        }

        let b0 = buf[0];
        let b1 = buf[1];

        let fin = b0 & 0b1000_0000 != 0;
        let rsv = b0 & 0b0111_0000;
        if rsv != 0 {
            return Err(ProtocolError::ReservedBitsSet);
        }
        let opcode_byte = b0 & 0b0000_1111;
        let opcode = OpCode::from_u8(opcode_byte).ok_or(ProtocolError::UnknownOpCode(opcode_byte))?;

        let masked = b1 & 0b1000_0000 != 0;
        if !masked {
            return Err(ProtocolError::MissingMask);
        }
        let len_field = b1 & 0b0111_1111;

        let mut header_len: usize = 2;
        let payload_len: u64 = match len_field {
            0..=125 => len_field as u64,
            126 => {
                header_len += 2;
                if buf.len() < header_len {
                    return Ok(None);
                }
                let ext = u16::from_be_bytes([buf[2], buf[3]]) as u64;
                if ext <= 125 {
                    return Err(ProtocolError::OverlongLength);
                }
                ext
            }
            127 => {
                header_len += 8;
                if buf.len() < header_len {
                    return Ok(None);
                }
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[2..10]);
                let ext = u64::from_be_bytes(raw);
                if ext <= 0xFFFF {
                    return Err(ProtocolError::OverlongLength);
                }
                ext
            }
            _ => unreachable!("7-bit field can't exceed 127"),
        };

        if opcode.is_control() {
            if payload_len > 125 {
                return Err(ProtocolError::ControlFrameTooLarge(payload_len));
            }
            if !fin {
                return Err(ProtocolError::FragmentedControlFrame);
            }
        }

        if payload_len > config.max_frame_payload {
            return Err(ProtocolError::FrameTooLarge {
                len: payload_len,
                max: config.max_frame_payload,
            });
        }

        let mask_offset = header_len;
        header_len += 4;
        let total_len = header_len + payload_len as usize;
        if buf.len() < total_len {
            return Ok(None);
        }

        let mut mask_key = [0u8; 4];
        mask_key.copy_from_slice(&buf[mask_offset..mask_offset + 4]);

        let mut frame_bytes = buf.split_to(total_len);
        frame_bytes.advance(header_len);
        let mut payload = frame_bytes.to_vec();
        unmask_in_place(&mut payload, mask_key);

        Ok(Some(RawFrame { fin, opcode, payload }))
    }
}

/// XOR-unmask `data` in place against the 4-byte cyclic `key`, four bytes
/// at a time where alignment allows, falling back to a byte loop for the
/// remainder.
fn unmask_in_place(data: &mut [u8], key: [u8; 4]) {
    let key_u32 = u32::from_ne_bytes(key);
    let chunks = data.chunks_exact_mut(4);
    let remainder_start = chunks.len() * 4;
    for chunk in chunks {
        let word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let unmasked = (word ^ key_u32).to_ne_bytes();
        chunk.copy_from_slice(&unmasked);
    }
    for (i, byte) in data[remainder_start..].iter_mut().enumerate() {
        *byte ^= key[(remainder_start + i) % 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masked_frame(fin: bool, opcode: OpCode, payload: &[u8], mask: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::new();
        let b0 = (if fin { 0x80 } else { 0 }) | opcode.to_u8();
        out.push(b0);
        let len = payload.len();
        if len <= 125 {
            out.push(0x80 | len as u8);
        } else if len <= 0xFFFF {
            out.push(0x80 | 126);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            out.push(0x80 | 127);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }
        out.extend_from_slice(&mask);
        let mut masked_payload = payload.to_vec();
        unmask_in_place(&mut masked_payload, mask);
        out.extend_from_slice(&masked_payload);
        out
    }

    #[test]
    fn decodes_the_rfc_example_hello_frame() {
        let raw = vec![0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];
        let mut buf = BytesMut::from(&raw[..]);
        let mut decoder = FrameDecoder::new();
        let frame = decoder
            .decode(&mut buf, &SessionConfig::default())
            .unwrap()
            .unwrap();
        assert!(frame.fin);
        assert_eq!(frame.opcode, OpCode::Text);
        assert_eq!(frame.payload, b"Hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn byte_by_byte_matches_one_shot() {
        let frame = masked_frame(true, OpCode::Binary, &[1u8; 300], [9, 8, 7, 6]);

        let mut one_shot = BytesMut::from(&frame[..]);
        let mut d1 = FrameDecoder::new();
        let whole = d1.decode(&mut one_shot, &SessionConfig::default()).unwrap().unwrap();

        let mut incremental = BytesMut::new();
        let mut d2 = FrameDecoder::new();
        let mut result = None;
        for byte in &frame {
            incremental.extend_from_slice(&[*byte]);
            if let Some(f) = d2.decode(&mut incremental, &SessionConfig::default()).unwrap() {
                result = Some(f);
                break;
            }
        }
        let piecewise = result.unwrap();

        assert_eq!(whole.opcode, piecewise.opcode);
        assert_eq!(whole.fin, piecewise.fin);
        assert_eq!(whole.payload, piecewise.payload);
    }

    #[test]
    fn rejects_missing_mask() {
        let raw = vec![0x81, 0x05, b'H', b'e', b'l', b'l', b'o'];
        let mut buf = BytesMut::from(&raw[..]);
        let mut decoder = FrameDecoder::new();
        let err = decoder.decode(&mut buf, &SessionConfig::default()).unwrap_err();
        assert_eq!(err, ProtocolError::MissingMask);
    }

    #[test]
    fn rejects_reserved_bits() {
        let raw = vec![0xF1, 0x80, 0, 0, 0, 0];
        let mut buf = BytesMut::from(&raw[..]);
        let mut decoder = FrameDecoder::new();
        let err = decoder.decode(&mut buf, &SessionConfig::default()).unwrap_err();
        assert_eq!(err, ProtocolError::ReservedBitsSet);
    }

    #[test]
    fn rejects_oversize_control_frame() {
        let frame = masked_frame(true, OpCode::Ping, &[0u8; 126], [1, 2, 3, 4]);
        let mut buf = BytesMut::from(&frame[..]);
        let mut decoder = FrameDecoder::new();
        let err = decoder.decode(&mut buf, &SessionConfig::default()).unwrap_err();
        assert_eq!(err, ProtocolError::ControlFrameTooLarge(126));
    }

    #[test]
    fn rejects_frame_over_configured_max() {
        let frame = masked_frame(true, OpCode::Binary, &[0u8; 200], [1, 2, 3, 4]);
        let mut buf = BytesMut::from(&frame[..]);
        let mut decoder = FrameDecoder::new();
        let mut config = SessionConfig::default();
        config.max_frame_payload = 100;
        let err = decoder.decode(&mut buf, &config).unwrap_err();
        assert_eq!(err, ProtocolError::FrameTooLarge { len: 200, max: 100 });
    }

    #[test]
    fn needs_more_on_partial_header() {
        let mut buf = BytesMut::from(&[0x81u8][..]);
        let mut decoder = FrameDecoder::new();
        let result = decoder.decode(&mut buf, &SessionConfig::default()).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn mask_xor_is_an_involution() {
        let key = [0xDE, 0xAD, 0xBE, 0xEF];
        let original = b"round trip payload of arbitrary length".to_vec();
        let mut data = original.clone();
        unmask_in_place(&mut data, key);
        unmask_in_place(&mut data, key);
        assert_eq!(data, original);
    }
}
