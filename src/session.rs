//! The per-connection event loop: handshake, then decode → assemble →
//! dispatch → encode until termination.

use crate::assembler::{AssembledEvent, MessageAssembler};
use crate::config::SessionConfig;
use crate::decoder::FrameDecoder;
use crate::encoder::{EncodeOutcome, FrameEncoder};
use crate::handler::{ExternalMessage, Handler, InitOutcome, Outcome, TerminateReason};
use crate::handshake::{accept_response, validate_upgrade, REJECTION_RESPONSE};
use crate::message::{Message, OutboundFrame};
use crate::request::HttpRequest;
use crate::transport::Transport;
use bytes::BytesMut;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Drives one upgraded connection: validates the handshake, runs
/// `Handler::init`, and on success owns the socket until the connection
/// terminates.
///
/// The handler is held as `Box<dyn Handler<...>>`: the session's own
/// generics (`T`, `S`, `I`, `O`) only need to be fixed once per connection
/// type, while the concrete handler implementation behind them is resolved
/// dynamically, matching the dynamic-dispatch handler model this crate's
/// behaviour was distilled from.
pub struct Session<T: Transport, S: Send, I: ExternalMessage, O> {
    id: Uuid,
    transport: T,
    handler: Box<dyn Handler<State = S, Info = I, Options = O>>,
    config: SessionConfig,
    info_rx: mpsc::UnboundedReceiver<I>,
}

/// What to do after folding one `Outcome` into the loop.
enum LoopSignal<S> {
    Continue(S),
    Terminate(TerminateReason, Option<S>),
}

impl<T: Transport, S: Send, I: ExternalMessage, O> Session<T, S, I, O> {
    pub fn new<H>(transport: T, handler: H, config: SessionConfig, info_rx: mpsc::UnboundedReceiver<I>) -> Self
    where
        H: Handler<State = S, Info = I, Options = O> + 'static,
    {
        Session {
            id: Uuid::new_v4(),
            transport,
            handler: Box::new(handler),
            config,
            info_rx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Validate the upgrade, call `Handler::init`, send the 101/400
    /// response, and on success run the event loop to completion.
    ///
    /// Returns `None` if the handshake was rejected: no session ever
    /// started, and `on_terminate` was never invoked.
    pub async fn accept(mut self, request: HttpRequest, options: O) -> Option<TerminateReason> {
        let key = match validate_upgrade(&request) {
            Ok(k) => k.to_string(),
            Err(e) => {
                log::warn!("[{}] handshake rejected: {e}", self.id);
                let _ = self.transport.write_all(REJECTION_RESPONSE.as_bytes()).await;
                return None;
            }
        };

        let transport_name = self.transport.name();
        let (state, idle_timeout, hibernate) = match self.handler.init(&transport_name, &request, &options) {
            InitOutcome::Ok(s) => (s, self.config.idle_timeout, false),
            InitOutcome::OkWithTimeout(s, d) => (s, Some(d), false),
            InitOutcome::OkHibernate(s) => (s, self.config.idle_timeout, true),
            InitOutcome::OkWithTimeoutHibernate(s, d) => (s, Some(d), true),
            InitOutcome::Shutdown => {
                log::debug!("[{}] handler declined the upgrade", self.id);
                let _ = self.transport.write_all(REJECTION_RESPONSE.as_bytes()).await;
                return None;
            }
        };

        if let Err(e) = self.transport.write_all(accept_response(&key).as_bytes()).await {
            log::warn!("[{}] failed to send handshake response: {e}", self.id);
            self.handler
                .on_terminate(TerminateReason::TransportError(e.to_string()), Some(state));
            return Some(TerminateReason::TransportError(e.to_string()));
        }
        log::debug!("[{}] upgraded {transport_name}", self.id);

        let reason = self.run(state, idle_timeout, hibernate).await;
        Some(reason)
    }

    async fn run(&mut self, mut state: S, idle_timeout: Option<Duration>, mut hibernate: bool) -> TerminateReason {
        let mut decoder = FrameDecoder::new();
        let mut assembler = MessageAssembler::new();
        let mut encoder = FrameEncoder::new();
        let mut buf = BytesMut::new();
        let (timer_tx, mut timer_rx) = mpsc::unbounded_channel::<u64>();
        let mut timer_epoch: u64 = 0;
        let mut info_closed = false;

        if let Some(d) = idle_timeout {
            arm_timer(&timer_tx, &mut timer_epoch, d);
        }

        let (final_reason, final_state): (TerminateReason, Option<S>) = 'outer: loop {
            // Hibernate is an advisory hint in this implementation: the
            // loop has no suspension point cheaper than the select below,
            // so the flag only documents intent and is cleared here.
            if hibernate {
                hibernate = false;
            }

            let mut read_scratch = Vec::new();
            tokio::select! {
                read_result = self.transport.read(&mut read_scratch) => {
                    match read_result {
                        // A plain TCP-level EOF with no WebSocket Close
                        // frame ever received is a normal close, distinct
                        // from `RemoteClosed` (an actual Close frame).
                        Ok(0) => break 'outer (TerminateReason::NormalClosed, Some(state)),
                        Ok(_) => {
                            buf.extend_from_slice(&read_scratch);
                            loop {
                                match decoder.decode(&mut buf, &self.config) {
                                    Ok(Some(frame)) => {
                                        if let Some(d) = idle_timeout {
                                            arm_timer(&timer_tx, &mut timer_epoch, d);
                                        }
                                        match assembler.push(frame, &self.config) {
                                            Ok(AssembledEvent::Pending) => continue,
                                            Ok(AssembledEvent::Close { status, reason }) => {
                                                let mut out = Vec::new();
                                                encoder.encode(&OutboundFrame::close(), &mut out);
                                                let _ = self.transport.write_all(&out).await;
                                                break 'outer (TerminateReason::RemoteClosed { status, reason }, Some(state));
                                            }
                                            Ok(AssembledEvent::Message(msg)) => {
                                                if let Message::Ping(ref payload) = msg {
                                                    let mut out = Vec::new();
                                                    encoder.encode(&OutboundFrame::Pong(payload.clone()), &mut out);
                                                    if let Err(e) = self.transport.write_all(&out).await {
                                                        break 'outer (TerminateReason::TransportError(e.to_string()), Some(state));
                                                    }
                                                }
                                                let handler = &mut self.handler;
                                                let result = catch_unwind(AssertUnwindSafe(|| handler.on_message(msg, state)));
                                                match result {
                                                    Ok(outcome) => {
                                                        match apply_outcome(outcome, &mut encoder, &mut self.transport, &mut hibernate).await {
                                                            LoopSignal::Continue(s) => state = s,
                                                            LoopSignal::Terminate(r, s) => break 'outer (r, s),
                                                        }
                                                    }
                                                    Err(_) => {
                                                        log::error!("[{}] handler panicked in on_message", self.id);
                                                        let mut out = Vec::new();
                                                        encoder.encode(&OutboundFrame::close(), &mut out);
                                                        let _ = self.transport.write_all(&out).await;
                                                        break 'outer (TerminateReason::HandlerError("panic in on_message".into()), None);
                                                    }
                                                }
                                            }
                                        }
                                    }
                                    Ok(None) => break,
                                    Err(e) => {
                                        log::warn!("[{}] protocol error: {e}", self.id);
                                        let mut out = Vec::new();
                                        encoder.encode(&OutboundFrame::close(), &mut out);
                                        let _ = self.transport.write_all(&out).await;
                                        break 'outer (TerminateReason::ProtocolError(e.to_string()), Some(state));
                                    }
                                }
                            }
                        }
                        Err(e) => break 'outer (TerminateReason::TransportError(e.to_string()), Some(state)),
                    }
                }
                info = self.info_rx.recv(), if !info_closed => {
                    match info {
                        Some(msg) => {
                            let handler = &mut self.handler;
                            let result = catch_unwind(AssertUnwindSafe(|| handler.on_info(msg, state)));
                            match result {
                                Ok(outcome) => {
                                    match apply_outcome(outcome, &mut encoder, &mut self.transport, &mut hibernate).await {
                                        LoopSignal::Continue(s) => state = s,
                                        LoopSignal::Terminate(r, s) => break 'outer (r, s),
                                    }
                                }
                                Err(_) => {
                                    log::error!("[{}] handler panicked in on_info", self.id);
                                    let mut out = Vec::new();
                                    encoder.encode(&OutboundFrame::close(), &mut out);
                                    let _ = self.transport.write_all(&out).await;
                                    break 'outer (TerminateReason::HandlerError("panic in on_info".into()), None);
                                }
                            }
                        }
                        None => info_closed = true,
                    }
                }
                tick = timer_rx.recv(), if idle_timeout.is_some() => {
                    if let Some(epoch) = tick {
                        if epoch == timer_epoch {
                            let mut out = Vec::new();
                            encoder.encode(&OutboundFrame::close(), &mut out);
                            let _ = self.transport.write_all(&out).await;
                            break 'outer (TerminateReason::NormalTimeout, Some(state));
                        }
                        // stale timer: a handle armed before the current one fired. Ignored by design.
                    }
                }
            }
        };

        self.handler.on_terminate(final_reason.clone(), final_state);
        final_reason
    }
}

fn arm_timer(tx: &mpsc::UnboundedSender<u64>, epoch: &mut u64, duration: Duration) {
    *epoch += 1;
    let my_epoch = *epoch;
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        let _ = tx.send(my_epoch);
    });
}

async fn apply_outcome<T: Transport, S>(
    outcome: Outcome<S>,
    encoder: &mut FrameEncoder,
    transport: &mut T,
    hibernate: &mut bool,
) -> LoopSignal<S> {
    match outcome {
        Outcome::Ok(s) => LoopSignal::Continue(s),
        Outcome::OkHibernate(s) => {
            *hibernate = true;
            LoopSignal::Continue(s)
        }
        Outcome::Reply(frames, s) => write_reply(frames, s, encoder, transport).await,
        Outcome::ReplyHibernate(frames, s) => {
            *hibernate = true;
            write_reply(frames, s, encoder, transport).await
        }
        Outcome::Shutdown(s) => {
            let mut out = Vec::new();
            encoder.encode(&OutboundFrame::close(), &mut out);
            let _ = transport.write_all(&out).await;
            LoopSignal::Terminate(TerminateReason::NormalShutdown, Some(s))
        }
    }
}

async fn write_reply<T: Transport, S>(
    frames: Vec<OutboundFrame>,
    state: S,
    encoder: &mut FrameEncoder,
    transport: &mut T,
) -> LoopSignal<S> {
    let mut out = Vec::new();
    let outcome = encoder.encode_many(&frames, &mut out);
    if let Err(e) = transport.write_all(&out).await {
        return LoopSignal::Terminate(TerminateReason::TransportError(e.to_string()), Some(state));
    }
    match outcome {
        EncodeOutcome::Shutdown => LoopSignal::Terminate(TerminateReason::NormalShutdown, Some(state)),
        EncodeOutcome::Continue => LoopSignal::Continue(state),
    }
}
