//! Connection capability consumed from the transport layer.
//!
//! A [`Connection`] carries exactly one request and its response. Commands
//! that finish on their own close the connection through a scoped guard on
//! every exit path; commands that stream hand it to the caller as a
//! [`Channel`].

use std::io;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crate::{Error, Result};

/// One host protocol channel.
///
/// Implementations own the byte-level request framing and the
/// `OKAY`/`FAIL` acknowledgements.
pub trait Connection {
    /// Sends one request line and consumes its acknowledgement.
    fn send(&mut self, line: &str) -> Result<()>;

    /// Reads up to `n` bytes. A short result means the stream ended.
    fn read(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Reads until the peer closes the stream.
    fn read_all(&mut self) -> Result<Vec<u8>>;

    /// Reads one length-prefixed text response.
    fn receive(&mut self) -> Result<String>;

    /// Reads one acknowledgement, failing with [`Error::Fail`] on `FAIL`.
    fn check_status(&mut self) -> Result<()>;

    /// Closes the connection.
    fn close(&mut self) -> Result<()>;
}

/// Opens connections to the host daemon.
pub trait Connect {
    /// Connection type produced.
    type Conn: Connection;

    /// Opens a fresh connection, honouring `timeout` if given.
    fn connect(&self, timeout: Option<Duration>) -> Result<Self::Conn>;
}

impl<F, C> Connect for F
where
    F: Fn(Option<Duration>) -> Result<C>,
    C: Connection,
{
    type Conn = C;

    fn connect(&self, timeout: Option<Duration>) -> Result<C> {
        self(timeout)
    }
}

/// Closes the wrapped connection when dropped.
#[derive(Debug)]
pub(crate) struct Scoped<C: Connection> {
    /// The guarded connection.
    conn: C,
    /// Set once the connection has been closed explicitly.
    closed: bool,
}

impl<C: Connection> Scoped<C> {
    /// Takes ownership of `conn`.
    pub(crate) const fn new(conn: C) -> Self {
        Self {
            conn,
            closed: false,
        }
    }

    /// Closes the connection now, reporting a failed close.
    pub(crate) fn close(mut self) -> Result<()> {
        self.closed = true;
        self.conn.close()
    }
}

impl<C: Connection> Deref for Scoped<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.conn
    }
}

impl<C: Connection> DerefMut for Scoped<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.conn
    }
}

impl<C: Connection> Drop for Scoped<C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.conn.close() {
            tracing::debug!(error = %e, "closing connection failed");
        }
    }
}

/// An open channel whose lifecycle belongs to the caller.
///
/// Returned by streaming commands (`sync:`, `log:`, local sockets, shell
/// handlers). Nothing in this crate reads from, writes to, or closes it
/// after handing it over.
#[derive(Debug)]
#[must_use = "a Channel stays open until it is closed"]
pub struct Channel<C> {
    /// The transferred connection.
    conn: C,
}

impl<C: Connection> Channel<C> {
    /// Wraps an open connection.
    pub(crate) const fn new(conn: C) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection.
    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Closes the channel.
    pub fn close(mut self) -> Result<()> {
        self.conn.close()
    }
}

impl<C> Deref for Channel<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.conn
    }
}

impl<C> DerefMut for Channel<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.conn
    }
}

impl<C: Connection> io::Read for Channel<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut Reader(&mut self.conn), buf)
    }
}

/// Adapts [`Connection::read`] to [`io::Read`].
pub(crate) struct Reader<'a, C>(pub(crate) &'a mut C);

impl<C: Connection> io::Read for Reader<'_, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = Connection::read(self.0, buf.len()).map_err(io::Error::other)?;
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }
}

/// Recovers an [`Error`] that was tunnelled through [`io::Error`].
pub(crate) fn lift(e: io::Error) -> Error {
    if !e.get_ref().is_some_and(|inner| inner.is::<Error>()) {
        return Error::Io(e);
    }
    match e.into_inner().map(|inner| inner.downcast::<Error>()) {
        Some(Ok(err)) => *err,
        Some(Err(other)) => Error::Io(io::Error::other(other)),
        None => Error::Io(io::Error::other("connection read failed")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::fake::{Event, FakeConnector, Reply};

    #[test]
    fn scoped_closes_on_drop() {
        let connector = FakeConnector::new([Reply::data("")]);
        {
            let _conn = Scoped::new(connector.connect(None).unwrap());
        }
        assert_eq!(connector.events(), [Event::Close]);
    }

    #[test]
    fn scoped_close_is_not_repeated() {
        let connector = FakeConnector::new([Reply::data("")]);
        let conn = Scoped::new(connector.connect(None).unwrap());
        conn.close().unwrap();
        assert_eq!(connector.events(), [Event::Close]);
    }

    #[test]
    fn channel_reads_through_connection() {
        let connector = FakeConnector::new([Reply::data("stream bytes")]);
        let mut channel = Channel::new(connector.connect(None).unwrap());
        let mut text = String::new();
        channel.read_to_string(&mut text).unwrap();
        assert_eq!(text, "stream bytes");
        assert!(connector.events().is_empty());
    }

    #[test]
    fn lift_restores_connection_errors() {
        let tunnelled = io::Error::other(Error::Fail("device offline".into()));
        assert!(matches!(lift(tunnelled), Error::Fail(m) if m == "device offline"));

        let plain = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        assert!(matches!(lift(plain), Error::Io(e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn closures_are_connectors() {
        let connector = FakeConnector::new([Reply::data("")]);
        let via_closure = |timeout: Option<Duration>| connector.connect(timeout);
        let _conn = Connect::connect(&via_closure, Some(Duration::from_secs(3))).unwrap();
        assert_eq!(connector.timeouts(), [Some(Duration::from_secs(3))]);
    }
}
