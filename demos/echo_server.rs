use log::*;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use ws_session_core::{
    Handler, HttpRequest, InitOutcome, Message, Outcome, OutboundFrame, Session, SessionConfig,
    TerminateReason, TokioTransport,
};

struct EchoHandler;

impl Handler for EchoHandler {
    type State = ();
    type Info = ();
    type Options = ();

    fn init(&mut self, transport_name: &str, _request: &HttpRequest, _options: &()) -> InitOutcome<Self::State> {
        info!("upgraded {transport_name}");
        InitOutcome::Ok(())
    }

    fn on_message(&mut self, message: Message, state: Self::State) -> Outcome<Self::State> {
        match message {
            Message::Text(s) => Outcome::reply_one(OutboundFrame::Text(s), state),
            Message::Binary(b) => Outcome::reply_one(OutboundFrame::Binary(b), state),
            Message::Ping(_) | Message::Pong(_) => Outcome::Ok(state),
        }
    }

    fn on_info(&mut self, _info: Self::Info, state: Self::State) -> Outcome<Self::State> {
        Outcome::Ok(state)
    }

    fn on_terminate(&mut self, reason: TerminateReason, _state: Option<Self::State>) {
        info!("session ended: {reason:?}");
    }
}

/// A stand-in for whatever HTTP layer a real deployment fronts this crate
/// with: reads just enough of the request line and headers to build the
/// `HttpRequest` this crate validates.
async fn read_upgrade_request(stream: &mut TcpStream) -> std::io::Result<HttpRequest> {
    use tokio::io::AsyncReadExt;

    let mut buf = Vec::new();
    let mut scratch = [0u8; 1024];
    loop {
        let n = stream.read(&mut scratch).await?;
        buf.extend_from_slice(&scratch[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || n == 0 {
            break;
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_string(), value.trim().to_string());
        }
    }

    Ok(HttpRequest::new(path, headers))
}

async fn handle_connection(peer: SocketAddr, mut stream: TcpStream) {
    let request = match read_upgrade_request(&mut stream).await {
        Ok(r) => r,
        Err(e) => {
            error!("failed to read upgrade request from {peer}: {e}");
            return;
        }
    };

    let transport = TokioTransport::new(peer.to_string(), stream);
    let (_info_tx, info_rx) = mpsc::unbounded_channel();
    let session = Session::new(transport, EchoHandler, SessionConfig::default(), info_rx);

    match session.accept(request, ()).await {
        Some(reason) => info!("{peer} closed: {reason:?}"),
        None => warn!("{peer} failed its handshake"),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let addr = "127.0.0.1:9002";
    let listener = TcpListener::bind(&addr).await.expect("Can't listen");
    info!("Listening on: {addr}");

    while let Ok((stream, peer)) = listener.accept().await {
        info!("Peer address: {peer}");
        tokio::spawn(handle_connection(peer, stream));
    }
}
