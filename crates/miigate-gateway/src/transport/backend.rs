//! Backend TCP client.
//!
//! Lifecycle of one render connection:
//! 1. connect, write the fixed-size request record
//! 2. read up to [`PROBE_WINDOW`] bytes (the probe)
//! 3. continue reading on the same socket only if the probe ended cleanly
//!
//! Dropping an [`Exchange`] (or the body stream built from it) closes the
//! socket; that is how a client disconnect reaches the backend.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use miigate_core::error::{RenderError, Result};
use miigate_core::protocol::request::RenderRequest;
use miigate_core::protocol::response::{read_failure, Probe, ReadFault, PROBE_WINDOW};

/// Read size for streamed glTF bodies.
pub const STREAM_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct BackendClient {
    addr: String,
    timeout: Option<Duration>,
}

impl BackendClient {
    pub fn new(addr: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self { addr: addr.into(), timeout }
    }

    /// Run one backend phase under the configured deadline.
    pub async fn within<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| RenderError::UpstreamTimeout)?,
            None => fut.await,
        }
    }

    /// Connect, send `request` and take the probe.
    ///
    /// Read faults are not errors here; they are carried in the probe so the
    /// classifier can still see a structured error that preceded them.
    pub async fn exchange(&self, request: &RenderRequest) -> Result<Exchange> {
        self.within(self.open(request.encode())).await
    }

    async fn open(&self, payload: Bytes) -> Result<Exchange> {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| connect_error(&self.addr, &e))?;

        if let Err(e) = stream.write_all(&payload).await {
            // the backend may have answered before dropping the connection
            let (window, _) = read_window(&mut stream, PROBE_WINDOW).await;
            return Ok(Exchange { probe: Probe::failed(window, ReadFault::from_io(&e)), stream: None });
        }

        let (window, fault) = read_window(&mut stream, PROBE_WINDOW).await;
        Ok(match fault {
            None => Exchange { probe: Probe::complete(window), stream: Some(stream) },
            Some(fault) => Exchange { probe: Probe::failed(window, fault), stream: None },
        })
    }
}

fn connect_error(addr: &str, e: &io::Error) -> RenderError {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => RenderError::UpstreamUnavailable(format!("{addr}: {e}")),
        _ => RenderError::UpstreamIo(format!("connect {addr}: {e}")),
    }
}

/// Fill up to `size` bytes. Returns what arrived and the fault that stopped
/// the read early, if any.
pub async fn read_window<R>(reader: &mut R, size: usize) -> (Bytes, Option<ReadFault>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; size];
    let mut filled = 0;
    let mut fault = None;
    while filled < size {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => {
                fault = Some(ReadFault::Eof);
                break;
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                fault = Some(ReadFault::from_io(&e));
                break;
            }
        }
    }
    buf.truncate(filled);
    (Bytes::from(buf), fault)
}

/// A classified-to-be backend response: the probe plus the socket, which is
/// kept only when the probe ended without a fault.
#[derive(Debug)]
pub struct Exchange {
    pub probe: Probe,
    stream: Option<TcpStream>,
}

impl Exchange {
    /// Response bytes `[offset, offset + len)`, reading past the probe window
    /// as needed. The buffer grows with what actually arrives.
    pub async fn read_body(self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let Exchange { probe, stream } = self;
        let held = probe.window.get(offset..).unwrap_or_default();
        let mut body = held[..held.len().min(len)].to_vec();
        if body.len() == len {
            return Ok(body);
        }

        let Some(stream) = stream else {
            let fault = probe.fault.clone().unwrap_or(ReadFault::Eof);
            return Err(read_failure(&probe.window, &fault));
        };
        let remaining = (len - body.len()) as u64;
        stream
            .take(remaining)
            .read_to_end(&mut body)
            .await
            .map_err(|e| read_failure(&probe.window, &ReadFault::from_io(&e)))?;
        if body.len() < len {
            return Err(read_failure(&probe.window, &ReadFault::Eof));
        }
        Ok(body)
    }

    /// The first `len` bytes of the response: the probe window, then the
    /// rest of the socket. Ends with an error item if the backend stops short.
    pub fn into_body_stream(self, len: u64) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        let head = io::Cursor::new(self.probe.window);
        let reader: Pin<Box<dyn AsyncRead + Send>> = match self.stream {
            Some(stream) => Box::pin(head.chain(stream)),
            None => Box::pin(head),
        };
        body_stream(reader, len)
    }
}

fn body_stream<R>(reader: R, len: u64) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
where
    R: AsyncRead + Send + Unpin + 'static,
{
    stream::unfold((reader.take(len), 0u64), move |(mut reader, sent)| async move {
        if sent >= len {
            return None;
        }
        let want = usize::try_from(len - sent).unwrap_or(STREAM_CHUNK).min(STREAM_CHUNK);
        let mut buf = BytesMut::with_capacity(want);
        match reader.read_buf(&mut buf).await {
            Ok(0) => {
                let e = io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("backend closed after {sent} of {len} glb bytes"),
                );
                Some((Err(e), (reader, len)))
            }
            Ok(n) => Some((Ok(buf.freeze()), (reader, sent + n as u64))),
            Err(e) => Some((Err(e), (reader, len))),
        }
    })
}
