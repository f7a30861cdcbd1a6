//! RFC 6455 server-side WebSocket protocol core.
//!
//! This crate implements the hard middle of a WebSocket server: validating
//! the HTTP upgrade handshake, incrementally decoding frames off a byte
//! stream, reassembling fragmented messages, driving an application
//! [`Handler`], and encoding replies back onto the wire. Parsing the raw
//! HTTP request line, accepting TCP connections, and choosing which
//! handler runs for a given route are all left to the caller — this crate
//! starts from an already-parsed [`HttpRequest`] and an I/O-capable
//! [`Transport`].

pub mod assembler;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod handler;
pub mod handshake;
pub mod message;
pub mod request;
pub mod session;
pub mod transport;

pub use config::SessionConfig;
pub use error::{HandshakeError, ProtocolError};
pub use frame::{OpCode, RawFrame};
pub use handler::{ExternalMessage, Handler, InitOutcome, Outcome, TerminateReason};
pub use message::{Message, OutboundFrame};
pub use request::HttpRequest;
pub use session::Session;
pub use transport::{TokioTransport, Transport};
