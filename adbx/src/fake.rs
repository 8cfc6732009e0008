//! Scripted connections for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crate::connection::{Connect, Connection};
use crate::{Error, Result};

/// Something a fake connection was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A request line, acknowledged as part of the send.
    Send(String),
    /// An explicit extra status check.
    CheckStatus,
    /// The connection was closed.
    Close,
}

/// How the next connection behaves.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Accept the request and stream these bytes back.
    Data(Vec<u8>),
    /// Answer the device request with `FAIL`.
    Reject(String),
    /// Accept the request but answer the next status check with `FAIL`.
    RejectStatus(String),
    /// Accept the request, stream these bytes, then fail the next read
    /// with a connection reset.
    Broken(Vec<u8>),
    /// Refuse to connect at all.
    Refuse,
}

impl Reply {
    /// Shorthand for [`Reply::Data`].
    pub fn data(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Data(bytes.into())
    }
}

/// Record shared by a connector and the connections it hands out.
#[derive(Debug, Default)]
struct Journal {
    /// Every event, across all connections, in order.
    events: RefCell<Vec<Event>>,
    /// Timeout requested for each connect call.
    timeouts: RefCell<Vec<Option<Duration>>>,
}

/// Connector replaying one [`Reply`] per connection.
#[derive(Debug, Default)]
pub struct FakeConnector {
    /// Remaining replies.
    replies: RefCell<VecDeque<Reply>>,
    /// Shared record.
    journal: Rc<Journal>,
}

impl FakeConnector {
    /// Creates a connector that serves `replies` in order.
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
            journal: Rc::default(),
        }
    }

    /// Returns every event recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.journal.events.borrow().clone()
    }

    /// Returns the request lines sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Send(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    /// Returns the timeout passed to each connect call.
    pub fn timeouts(&self) -> Vec<Option<Duration>> {
        self.journal.timeouts.borrow().clone()
    }

    /// Returns the number of connections opened.
    pub fn connects(&self) -> usize {
        self.journal.timeouts.borrow().len()
    }
}

impl Connect for FakeConnector {
    type Conn = FakeConnection;

    fn connect(&self, timeout: Option<Duration>) -> Result<FakeConnection> {
        self.journal.timeouts.borrow_mut().push(timeout);
        let reply = self.replies.borrow_mut().pop_front().unwrap_or(Reply::Refuse);
        let mut conn = FakeConnection {
            journal: Rc::clone(&self.journal),
            data: VecDeque::new(),
            reject: None,
            reject_status: None,
            broken: false,
        };
        match reply {
            Reply::Data(bytes) => conn.data = bytes.into(),
            Reply::Reject(msg) => conn.reject = Some(msg),
            Reply::RejectStatus(msg) => conn.reject_status = Some(msg),
            Reply::Broken(bytes) => {
                conn.data = bytes.into();
                conn.broken = true;
            }
            Reply::Refuse => {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "no daemon").into());
            }
        }
        Ok(conn)
    }
}

/// One scripted connection.
#[derive(Debug)]
pub struct FakeConnection {
    /// Shared record.
    journal: Rc<Journal>,
    /// Bytes left to read.
    data: VecDeque<u8>,
    /// `FAIL` message for the first device request.
    reject: Option<String>,
    /// `FAIL` message for the first explicit status check.
    reject_status: Option<String>,
    /// Whether reading past the scripted bytes resets the connection.
    broken: bool,
}

impl FakeConnection {
    /// Appends an event to the shared record.
    fn record(&self, event: Event) {
        self.journal.events.borrow_mut().push(event);
    }
}

impl Connection for FakeConnection {
    fn send(&mut self, line: &str) -> Result<()> {
        self.record(Event::Send(line.to_owned()));
        if line.starts_with("host:transport:") {
            return Ok(());
        }
        match self.reject.take() {
            Some(msg) => Err(Error::Fail(msg)),
            None => Ok(()),
        }
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        if self.data.is_empty() && self.broken {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset").into());
        }
        let n = n.min(self.data.len());
        Ok(self.data.drain(..n).collect())
    }

    fn read_all(&mut self) -> Result<Vec<u8>> {
        Ok(self.data.drain(..).collect())
    }

    fn receive(&mut self) -> Result<String> {
        let bytes = self.read_all()?;
        Ok(String::from_utf8(bytes)?)
    }

    fn check_status(&mut self) -> Result<()> {
        self.record(Event::CheckStatus);
        match self.reject_status.take() {
            Some(msg) => Err(Error::Fail(msg)),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.record(Event::Close);
        Ok(())
    }
}
