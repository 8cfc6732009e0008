//! Device handle and command dispatch.
//!
//! Every device command opens its own connection, selects the device's
//! transport with `host:transport:<serial>`, then sends exactly one request.

use std::time::Duration;

use adbx_proto::Command;
use tracing::Span;

use crate::Result;
use crate::config::DeviceConfig;
use crate::connection::{Channel, Connect, Connection, Scoped};
use crate::error::Error;

/// Shell command that captures the screen as PNG.
const SCREENCAP: &str = "/system/bin/screencap -p";

/// A device reachable through the host daemon.
///
/// Holds no connection between calls; each command opens and closes its
/// own, or hands it over as a [`Channel`].
#[derive(Debug)]
pub struct Device<C> {
    /// Opens connections to the host daemon.
    connector: C,
    /// Device serial used for transport selection.
    serial: String,
    /// Timeouts and poll settings.
    config: DeviceConfig,
    /// Span all events of this device are recorded in.
    span: Span,
}

/// Builder for a [`Device`].
///
/// # Example
///
/// ```no_run
/// # fn demo(connector: impl adbx::Connect) -> adbx::Result<()> {
/// use std::time::Duration;
///
/// let device = adbx::Device::builder(connector, "emulator-5554")
///     .timeout(Duration::from_secs(5))
///     .build();
/// let uptime = device.shell("cat /proc/uptime")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
#[must_use = "a DeviceBuilder does nothing until .build() is called"]
pub struct DeviceBuilder<C> {
    /// Connection factory.
    connector: C,
    /// Device serial.
    serial: String,
    /// Settings.
    config: DeviceConfig,
    /// Caller-supplied span, if any.
    span: Option<Span>,
}

impl<C: Connect> DeviceBuilder<C> {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the default connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Records this device's events inside `span` instead of a fresh
    /// `device{serial}` span.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Builds the device handle.
    pub fn build(self) -> Device<C> {
        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("device", serial = %self.serial));
        Device {
            connector: self.connector,
            serial: self.serial,
            config: self.config,
            span,
        }
    }
}

impl<C: Connect> Device<C> {
    /// Creates a handle with default settings.
    pub fn new(connector: C, serial: impl Into<String>) -> Self {
        Self::builder(connector, serial).build()
    }

    /// Starts building a handle.
    pub fn builder(connector: C, serial: impl Into<String>) -> DeviceBuilder<C> {
        DeviceBuilder {
            connector,
            serial: serial.into(),
            config: DeviceConfig::default(),
            span: None,
        }
    }

    /// Returns the device serial.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Returns the settings.
    pub const fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the connection factory.
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Returns the span this device logs into.
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Scopes `conn` to this device and returns it for the next request.
    ///
    /// On failure the connection is closed.
    pub fn transport<T: Connection>(&self, conn: T) -> Result<T> {
        self.send_or_close(conn, Command::Transport(&self.serial))
    }

    /// Opens the file-transfer service.
    pub fn sync(&self) -> Result<Channel<C::Conn>> {
        self.open_channel(Command::Sync, None)
    }

    /// Opens a local socket or path on the device.
    ///
    /// A bare path such as `/dev/socket/x` becomes
    /// `localfilesystem:/dev/socket/x`; `localabstract:name` is sent as is.
    pub fn local(&self, path: &str) -> Result<Channel<C::Conn>> {
        self.open_channel(Command::Local(path), None)
    }

    /// Opens the named log buffer.
    pub fn log(&self, name: &str) -> Result<Channel<C::Conn>> {
        self.open_channel(Command::Log(name), None)
    }

    /// Captures the screen as PNG bytes.
    ///
    /// Old daemons ran the shell through a pty that rewrote `\n` as
    /// `\r\n`. That is detected by a `\r` at offset 5 of the PNG signature,
    /// in which case every `\r\n` pair is collapsed back to `\n`. An
    /// untranslated image that happens to contain `\r\n` would be damaged
    /// by this, but such an image never has `\r` at offset 5.
    pub fn screencap(&self) -> Result<Vec<u8>> {
        let mut conn = self.open(Command::Shell(SCREENCAP), None)?;
        let raw = conn.read_all()?;
        conn.close()?;
        Ok(undo_crlf(raw))
    }

    /// Raw framebuffer capture.
    ///
    /// Always returns [`Error::Unsupported`]; use [`Device::screencap`].
    pub const fn framebuffer(&self) -> Result<Vec<u8>> {
        Err(Error::Unsupported("framebuffer"))
    }

    /// Log tailing through `logcat`.
    ///
    /// Always returns [`Error::Unsupported`]; open a buffer with
    /// [`Device::log`] or run `logcat -d` through [`Device::shell`].
    pub const fn logcat(&self, _clear: bool) -> Result<Channel<C::Conn>> {
        Err(Error::Unsupported("logcat"))
    }

    /// Opens a transport-scoped connection.
    pub(crate) fn create_connection(&self, timeout: Option<Duration>) -> Result<C::Conn> {
        let conn = self
            .connector
            .connect(timeout.or_else(|| self.config.timeout()))?;
        self.transport(conn)
    }

    /// Sends `cmd` on a fresh connection that is closed when dropped.
    pub(crate) fn open(
        &self,
        cmd: Command<'_>,
        timeout: Option<Duration>,
    ) -> Result<Scoped<C::Conn>> {
        let mut conn = Scoped::new(self.create_connection(timeout)?);
        self.dispatch(&mut *conn, cmd)?;
        Ok(conn)
    }

    /// Sends `cmd` on a fresh connection and hands it to the caller.
    pub(crate) fn open_channel(
        &self,
        cmd: Command<'_>,
        timeout: Option<Duration>,
    ) -> Result<Channel<C::Conn>> {
        let conn = self.create_connection(timeout)?;
        self.send_or_close(conn, cmd).map(Channel::new)
    }

    /// Sends one request line.
    fn dispatch(&self, conn: &mut impl Connection, cmd: Command<'_>) -> Result<()> {
        let line = cmd.to_string();
        self.span
            .in_scope(|| tracing::debug!(command = %line, "dispatch"));
        conn.send(&line)
    }

    /// Sends `cmd`, closing `conn` if that fails.
    fn send_or_close<T: Connection>(&self, mut conn: T, cmd: Command<'_>) -> Result<T> {
        match self.dispatch(&mut conn, cmd) {
            Ok(()) => Ok(conn),
            Err(e) => {
                drop(Scoped::new(conn));
                Err(e)
            }
        }
    }
}

/// Collapses `\r\n` to `\n` when the capture shows pty translation.
fn undo_crlf(raw: Vec<u8>) -> Vec<u8> {
    if raw.get(5) != Some(&b'\r') {
        return raw;
    }
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        if b == b'\r' && bytes.peek() == Some(&b'\n') {
            continue;
        }
        out.push(b);
    }
    out
}
