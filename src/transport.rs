//! The byte-channel abstraction a `Session` drives.
//!
//! `Transport` is a plain (non-`dyn`) trait using native `async fn` in
//! trait — stable since 1.75, so no `async-trait` dependency is needed.
//! `Session` is generic over it, which keeps the hot path free of the
//! extra boxed-future allocation `async-trait` would otherwise impose.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A duplex byte channel a session can read from and write to.
pub trait Transport: Send {
    /// A human-readable name for log correlation (e.g. the peer address).
    fn name(&self) -> String;

    /// Read at least one byte into `buf`, appending to it. Returns the
    /// number of bytes read; `0` means the peer closed the connection.
    fn read(&mut self, buf: &mut Vec<u8>) -> impl std::future::Future<Output = std::io::Result<usize>> + Send;

    /// Write the full contents of `bytes` to the peer.
    fn write_all(&mut self, bytes: &[u8]) -> impl std::future::Future<Output = std::io::Result<()>> + Send;
}

/// A `Transport` over any Tokio-compatible duplex stream (`TcpStream`,
/// a TLS-wrapped stream, a Unix socket, ...).
pub struct TokioTransport<S> {
    name: String,
    inner: S,
}

impl<S> TokioTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(name: impl Into<String>, inner: S) -> Self {
        TokioTransport { name: name.into(), inner }
    }
}

impl<S> Transport for TokioTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn read(&mut self, buf: &mut Vec<u8>) -> std::io::Result<usize> {
        let mut scratch = [0u8; 8192];
        let n = self.inner.read(&mut scratch).await?;
        buf.extend_from_slice(&scratch[..n]);
        Ok(n)
    }

    async fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await
    }
}
