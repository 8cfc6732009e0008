//! Shell protocol v2 frames and the output demultiplexer.
//!
//! Each frame is: `[u8 id][u32 little-endian length][payload]`.
//!
//! A stream ends at the first short read. A frame cut off anywhere in its
//! header or payload counts as end of stream, not as an error.

use std::io::{self, Read, Write};

/// Exit code reported when the stream ends without an [`FrameId::Exit`] frame.
pub const DEFAULT_EXIT_CODE: u32 = 255;

/// Shell v2 frame type, as defined by the device daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum FrameId {
    /// Data for the remote process's stdin.
    Stdin = 0,
    /// A chunk of stdout.
    Stdout = 1,
    /// A chunk of stderr.
    Stderr = 2,
    /// Process exit status.
    Exit = 3,
    /// Close the remote process's stdin.
    CloseStdin = 4,
    /// Terminal size change, as an ASCII `struct winsize`.
    WindowSizeChange = 5,
    /// Invalid or unknown frame.
    Invalid = 255,
}

impl FrameId {
    /// Maps a raw id byte; unrecognised values become [`FrameId::Invalid`].
    pub const fn from_byte(b: u8) -> Self {
        match b {
            0 => Self::Stdin,
            1 => Self::Stdout,
            2 => Self::Stderr,
            3 => Self::Exit,
            4 => Self::CloseStdin,
            5 => Self::WindowSizeChange,
            _ => Self::Invalid,
        }
    }
}

/// One shell v2 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame type.
    pub id: FrameId,
    /// Frame payload.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Creates a frame.
    pub fn new(id: FrameId, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    /// Reads the next frame from `r`.
    ///
    /// Returns `Ok(None)` once the stream ends, including when it ends in
    /// the middle of a frame. The payload buffer grows with the bytes that
    /// actually arrive, so a bogus length never triggers a large allocation.
    pub fn read_from(r: &mut impl Read) -> io::Result<Option<Self>> {
        let mut id = [0u8; 1];
        if read_up_to(r, &mut id)? < id.len() {
            return Ok(None);
        }
        let mut len = [0u8; 4];
        if read_up_to(r, &mut len)? < len.len() {
            return Ok(None);
        }
        let len = u32::from_le_bytes(len);

        let mut payload = Vec::new();
        r.by_ref().take(u64::from(len)).read_to_end(&mut payload)?;
        if payload.len() as u64 != u64::from(len) {
            return Ok(None);
        }
        Ok(Some(Self {
            id: FrameId::from_byte(id[0]),
            payload,
        }))
    }

    /// Writes this frame to `w`.
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        let len = u32::try_from(self.payload.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame exceeds u32::MAX"))?;
        w.write_all(&[self.id as u8])?;
        w.write_all(&len.to_le_bytes())?;
        w.write_all(&self.payload)
    }
}

/// How stdout and stderr are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum Streams {
    /// Interleave stdout and stderr into one buffer, in arrival order.
    #[default]
    Merged,
    /// Keep stdout and stderr apart.
    Separate,
}

/// Collected output of a shell v2 session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::exhaustive_enums)]
pub enum Output {
    /// Stdout and stderr interleaved.
    Merged {
        /// Combined output bytes.
        output: Vec<u8>,
        /// Exit code, [`DEFAULT_EXIT_CODE`] if none was received.
        exit_code: u32,
    },
    /// Stdout and stderr kept apart.
    Separate {
        /// Stdout bytes.
        stdout: Vec<u8>,
        /// Stderr bytes.
        stderr: Vec<u8>,
        /// Exit code, [`DEFAULT_EXIT_CODE`] if none was received.
        exit_code: u32,
    },
}

impl Output {
    /// Returns the exit code.
    pub const fn exit_code(&self) -> u32 {
        match self {
            Self::Merged { exit_code, .. } | Self::Separate { exit_code, .. } => *exit_code,
        }
    }
}

/// Splits a shell v2 frame stream into output buffers and an exit code.
///
/// Only end of stream terminates the session: frames that follow an
/// [`FrameId::Exit`] frame are still consumed.
#[derive(Debug)]
pub struct Demux {
    /// Collection mode.
    streams: Streams,
    /// Stdout, or all output in [`Streams::Merged`] mode.
    out: Vec<u8>,
    /// Stderr in [`Streams::Separate`] mode.
    err: Vec<u8>,
    /// Last exit code seen.
    exit_code: Option<u32>,
}

impl Demux {
    /// Creates an empty demultiplexer.
    pub const fn new(streams: Streams) -> Self {
        Self {
            streams,
            out: Vec::new(),
            err: Vec::new(),
            exit_code: None,
        }
    }

    /// Reads frames from `r` until the stream ends.
    pub fn run(mut self, r: &mut impl Read) -> io::Result<Output> {
        while let Some(frame) = Frame::read_from(r)? {
            self.push(frame);
        }
        Ok(self.finish())
    }

    /// Applies one frame.
    pub fn push(&mut self, frame: Frame) {
        match (frame.id, self.streams) {
            (FrameId::Stdout | FrameId::Stderr, Streams::Merged)
            | (FrameId::Stdout, Streams::Separate) => self.out.extend(frame.payload),
            (FrameId::Stderr, Streams::Separate) => self.err.extend(frame.payload),
            (FrameId::Exit, _) => self.exit_code = Some(exit_code(&frame.payload)),
            _ => {}
        }
    }

    /// Returns what has been collected so far.
    pub fn finish(self) -> Output {
        let exit_code = self.exit_code.unwrap_or(DEFAULT_EXIT_CODE);
        match self.streams {
            Streams::Merged => Output::Merged {
                output: self.out,
                exit_code,
            },
            Streams::Separate => Output::Separate {
                stdout: self.out,
                stderr: self.err,
                exit_code,
            },
        }
    }
}

/// Decodes a little-endian exit status.
///
/// A status wider than 32 bits saturates to `u32::MAX` so it never reads
/// as success.
fn exit_code(payload: &[u8]) -> u32 {
    if payload.iter().skip(4).any(|&b| b != 0) {
        return u32::MAX;
    }
    let mut buf = [0u8; 4];
    let n = payload.len().min(buf.len());
    buf[..n].copy_from_slice(&payload[..n]);
    u32::from_le_bytes(buf)
}

/// Fills `buf` until it is full or `r` reports end of stream.
fn read_up_to(r: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
