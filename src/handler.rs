//! The application-facing callback contract.
//!
//! Callbacks are synchronous: the session that drives them never suspends
//! inside one, so there is no reason for them to be `async` — mirroring
//! the non-suspending handler-callback model this crate's behaviour was
//! distilled from. Only `Session::run` itself is `async`.

use crate::message::{Message, OutboundFrame};
use crate::request::HttpRequest;
use std::time::Duration;

/// Why a session ended. Handed to `Handler::on_terminate` exactly once
/// per session that completed its handshake.
#[derive(Debug, Clone)]
pub enum TerminateReason {
    NormalClosed,
    NormalShutdown,
    NormalTimeout,
    RemoteClosed { status: Option<u16>, reason: Vec<u8> },
    TransportError(String),
    HandlerError(String),
    ProtocolError(String),
}

/// Result of `Handler::init`.
pub enum InitOutcome<S> {
    Ok(S),
    OkWithTimeout(S, Duration),
    OkHibernate(S),
    OkWithTimeoutHibernate(S, Duration),
    Shutdown,
}

/// Result of `Handler::on_message` / `Handler::on_info`.
pub enum Outcome<S> {
    Ok(S),
    OkHibernate(S),
    Reply(Vec<OutboundFrame>, S),
    ReplyHibernate(Vec<OutboundFrame>, S),
    Shutdown(S),
}

impl<S> Outcome<S> {
    pub fn reply_one(frame: OutboundFrame, state: S) -> Self {
        Outcome::Reply(vec![frame], state)
    }
}

/// An opaque message a session can receive from outside the connection
/// (e.g. a broadcast fan-out), delivered to `Handler::on_info`.
pub trait ExternalMessage: Send + 'static {}
impl<T: Send + 'static> ExternalMessage for T {}

/// The application module a `Session` drives. All four callbacks are
/// synchronous and must not block for long: the session processes exactly
/// one event at a time and nothing else runs concurrently with them for
/// the same connection.
pub trait Handler: Send {
    type State: Send;
    type Info: ExternalMessage;
    /// Per-route configuration the integrator attaches when wiring this
    /// handler up, handed back unchanged on every `init` call. Use `()`
    /// when a handler has nothing to configure.
    type Options: Send;

    fn init(
        &mut self,
        transport_name: &str,
        request: &HttpRequest,
        options: &Self::Options,
    ) -> InitOutcome<Self::State>;

    fn on_message(&mut self, message: Message, state: Self::State) -> Outcome<Self::State>;

    fn on_info(&mut self, info: Self::Info, state: Self::State) -> Outcome<Self::State>;

    /// `state` is `None` only when a prior callback panicked: the state it
    /// owned was lost to the unwind, so there is nothing left to hand back.
    fn on_terminate(&mut self, reason: TerminateReason, state: Option<Self::State>);
}
