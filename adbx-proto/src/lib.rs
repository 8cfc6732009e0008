//! Wire-level pieces of the debug bridge host protocol.
//!
//! Requests are single command lines such as `shell:ls` or
//! `host:transport:<serial>` (see [`Command`]). Remote command execution
//! over shell protocol v2 answers with a stream of typed frames,
//! `[u8 id][u32 little-endian length][payload]`, which [`Demux`] splits
//! back into stdout, stderr and an exit code.

mod command;
mod shell;

pub use command::Command;
pub use shell::{DEFAULT_EXIT_CODE, Demux, Frame, FrameId, Output, Streams};
