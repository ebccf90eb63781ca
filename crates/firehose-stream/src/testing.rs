//! In-memory dialer for driving connections from a script.

use async_trait::async_trait;
use firehose_types::{Credentials, Session};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::Security;
use crate::dialer::{BoxTransport, Dialer};

/// Bytes handed out per read, so responses arrive in fragments. A read never
/// runs past the end of a line, so nothing is read ahead of what the client
/// asks for.
const READ_FRAGMENT: usize = 16;

pub(crate) fn session() -> Session {
    let credentials = Credentials::new("user", "secret").unwrap();
    Session::new(credentials, "stream.example.com", 80)
}

/// One scripted connection attempt.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Name resolution fails.
    ResolveFail,
    /// Resolution succeeds, dialing is refused.
    DialFail,
    /// The peer sends these bytes, then closes.
    Serve(Vec<u8>),
    /// The peer sends these bytes, then goes silent.
    ServeThenStall(Vec<u8>),
}

impl Step {
    pub(crate) fn serve(response: &str) -> Self {
        Self::Serve(response.as_bytes().to_vec())
    }

    pub(crate) fn stall(response: &str) -> Self {
        Self::ServeThenStall(response.as_bytes().to_vec())
    }
}

/// Plays back one [`Step`] per connection attempt. An exhausted script
/// refuses every dial.
#[derive(Debug)]
pub(crate) struct ScriptedDialer {
    steps: Mutex<VecDeque<Step>>,
    addresses: Vec<SocketAddr>,
    resolved: Mutex<Vec<String>>,
    dialed: Mutex<Vec<SocketAddr>>,
    written: Arc<Mutex<Vec<u8>>>,
    read: Arc<AtomicUsize>,
    resolve_delay: Duration,
    dial_delay: Duration,
}

impl ScriptedDialer {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            addresses: vec![SocketAddr::from(([192, 0, 2, 1], 80))],
            resolved: Mutex::new(Vec::new()),
            dialed: Mutex::new(Vec::new()),
            written: Arc::new(Mutex::new(Vec::new())),
            read: Arc::new(AtomicUsize::new(0)),
            resolve_delay: Duration::ZERO,
            dial_delay: Duration::ZERO,
        }
    }

    /// Makes every resolve and dial take the given time.
    pub(crate) const fn with_delays(mut self, resolve: Duration, dial: Duration) -> Self {
        self.resolve_delay = resolve;
        self.dial_delay = dial;
        self
    }

    pub(crate) fn with_addresses(mut self, addresses: Vec<SocketAddr>) -> Self {
        self.addresses = addresses;
        self
    }

    /// Everything written by the client, across all connections.
    pub(crate) fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.written)
    }

    /// Bytes handed to the client, across all connections.
    pub(crate) fn bytes_read(&self) -> usize {
        self.read.load(Ordering::SeqCst)
    }

    pub(crate) fn dialed(&self) -> Vec<SocketAddr> {
        self.dialed.lock().unwrap().clone()
    }

    pub(crate) fn dials(&self) -> usize {
        self.dialed.lock().unwrap().len()
    }

    pub(crate) fn resolved_names(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn resolve(&self, host: &str, _port: u16) -> io::Result<Vec<SocketAddr>> {
        if !self.resolve_delay.is_zero() {
            tokio::time::sleep(self.resolve_delay).await;
        }
        self.resolved.lock().unwrap().push(host.to_string());
        let mut steps = self.steps.lock().unwrap();
        if matches!(steps.front(), Some(Step::ResolveFail)) {
            steps.pop_front();
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such host"));
        }
        Ok(self.addresses.clone())
    }

    async fn dial(&self, addr: SocketAddr, _host: &str, _security: Security) -> io::Result<BoxTransport> {
        if !self.dial_delay.is_zero() {
            tokio::time::sleep(self.dial_delay).await;
        }
        self.dialed.lock().unwrap().push(addr);
        let step = self.steps.lock().unwrap().pop_front();
        let (data, stall) = match step {
            Some(Step::Serve(data)) => (data, false),
            Some(Step::ServeThenStall(data)) => (data, true),
            Some(Step::ResolveFail | Step::DialFail) | None => {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"));
            }
        };
        Ok(Box::new(ScriptedStream {
            data,
            position: 0,
            stall,
            written: Arc::clone(&self.written),
            read: Arc::clone(&self.read),
        }))
    }
}

struct ScriptedStream {
    data: Vec<u8>,
    position: usize,
    stall: bool,
    written: Arc<Mutex<Vec<u8>>>,
    read: Arc<AtomicUsize>,
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        let rest = &this.data[this.position..];
        if rest.is_empty() {
            return if this.stall {
                Poll::Pending
            } else {
                Poll::Ready(Ok(()))
            };
        }
        let mut n = rest.len().min(READ_FRAGMENT);
        let window = &rest[..(n + 1).min(rest.len())];
        if let Some(end) = window.windows(2).position(|pair| pair == b"\r\n") {
            n = end + 2;
        }
        let n = n.min(buf.remaining());
        buf.put_slice(&rest[..n]);
        this.position += n;
        this.read.fetch_add(n, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
