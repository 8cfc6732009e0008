//! Remote command execution over the shell services.

use std::time::Duration;

use adbx_proto::{Command, Demux, Output, Streams};

use crate::Result;
use crate::connection::{self, Channel, Connect, Connection, Reader};
use crate::device::Device;

/// Decoded result of a shell v2 command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShellOutput {
    /// Stdout and stderr interleaved in arrival order.
    Merged {
        /// Combined output.
        output: String,
        /// Exit code, 255 if the stream ended without one.
        exit_code: u32,
    },
    /// Stdout and stderr kept apart.
    Separate {
        /// Stdout text.
        stdout: String,
        /// Stderr text.
        stderr: String,
        /// Exit code, 255 if the stream ended without one.
        exit_code: u32,
    },
}

impl ShellOutput {
    /// Returns the exit code.
    pub const fn exit_code(&self) -> u32 {
        match self {
            Self::Merged { exit_code, .. } | Self::Separate { exit_code, .. } => *exit_code,
        }
    }

    /// Decodes collected frame payloads as UTF-8.
    fn decode(output: Output) -> Result<Self> {
        Ok(match output {
            Output::Separate {
                stdout,
                stderr,
                exit_code,
            } => Self::Separate {
                stdout: String::from_utf8(stdout)?,
                stderr: String::from_utf8(stderr)?,
                exit_code,
            },
            Output::Merged { output, exit_code } => Self::Merged {
                output: String::from_utf8(output)?,
                exit_code,
            },
        })
    }
}

impl<C: Connect> Device<C> {
    /// Runs `cmd` and returns everything it printed.
    ///
    /// Fails with [`Error::Decode`](crate::Error::Decode) if the output is
    /// not UTF-8.
    pub fn shell(&self, cmd: &str) -> Result<String> {
        self.run_shell(cmd, None)
    }

    /// Like [`Device::shell`] with an explicit connection timeout.
    pub fn shell_timeout(&self, cmd: &str, timeout: Duration) -> Result<String> {
        self.run_shell(cmd, Some(timeout))
    }

    /// Starts `cmd` and passes the open channel to `handler`.
    ///
    /// The handler owns the channel: it reads the output and closes it.
    pub fn shell_with<R>(
        &self,
        cmd: &str,
        handler: impl FnOnce(Channel<C::Conn>) -> R,
    ) -> Result<R> {
        self.run_with(Command::Shell(cmd), None, handler)
    }

    /// Like [`Device::shell_with`] with an explicit connection timeout.
    pub fn shell_with_timeout<R>(
        &self,
        cmd: &str,
        timeout: Duration,
        handler: impl FnOnce(Channel<C::Conn>) -> R,
    ) -> Result<R> {
        self.run_with(Command::Shell(cmd), Some(timeout), handler)
    }

    /// Runs `cmd` over shell protocol v2 and collects its output.
    ///
    /// A stream cut off mid-frame is not an error: the output gathered so
    /// far is returned, with exit code 255 if no exit frame arrived.
    pub fn shell_v2(&self, cmd: &str, streams: Streams) -> Result<ShellOutput> {
        self.run_shell_v2(cmd, streams, None)
    }

    /// Like [`Device::shell_v2`] with an explicit connection timeout.
    pub fn shell_v2_timeout(
        &self,
        cmd: &str,
        streams: Streams,
        timeout: Duration,
    ) -> Result<ShellOutput> {
        self.run_shell_v2(cmd, streams, Some(timeout))
    }

    /// Starts `cmd` over shell protocol v2 and passes the raw framed
    /// channel to `handler`.
    pub fn shell_v2_with<R>(
        &self,
        cmd: &str,
        handler: impl FnOnce(Channel<C::Conn>) -> R,
    ) -> Result<R> {
        self.run_with(Command::ShellV2(cmd), None, handler)
    }

    /// Like [`Device::shell_v2_with`] with an explicit connection timeout.
    pub fn shell_v2_with_timeout<R>(
        &self,
        cmd: &str,
        timeout: Duration,
        handler: impl FnOnce(Channel<C::Conn>) -> R,
    ) -> Result<R> {
        self.run_with(Command::ShellV2(cmd), Some(timeout), handler)
    }

    /// Opens `cmd` and hands the channel to `handler`.
    fn run_with<R>(
        &self,
        cmd: Command<'_>,
        timeout: Option<Duration>,
        handler: impl FnOnce(Channel<C::Conn>) -> R,
    ) -> Result<R> {
        let channel = self.open_channel(cmd, timeout)?;
        Ok(handler(channel))
    }

    /// Runs a v1 shell command to completion.
    fn run_shell(&self, cmd: &str, timeout: Option<Duration>) -> Result<String> {
        let mut conn = self.open(Command::Shell(cmd), timeout)?;
        let raw = conn.read_all()?;
        conn.close()?;
        Ok(String::from_utf8(raw)?)
    }

    /// Runs a v2 shell command to completion.
    fn run_shell_v2(
        &self,
        cmd: &str,
        streams: Streams,
        timeout: Option<Duration>,
    ) -> Result<ShellOutput> {
        let mut conn = self.open(Command::ShellV2(cmd), timeout)?;
        let output = Demux::new(streams)
            .run(&mut Reader(&mut *conn))
            .map_err(connection::lift)?;
        conn.close()?;
        ShellOutput::decode(output)
    }
}
