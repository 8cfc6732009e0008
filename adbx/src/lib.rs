//! Device command layer for the Android debug bridge host protocol.
//!
//! `adbx` formats host protocol requests for one device, sends them over a
//! caller-supplied [`Connection`], and decodes the replies: plain shell
//! output, shell protocol v2 frame streams, `pm`/`getprop` listings and
//! reverse forward tables. The byte-level transport to the host daemon is
//! left to the [`Connect`] implementation.
//!
//! # Quick start
//!
//! ```no_run
//! use adbx::{Device, Streams};
//!
//! # fn demo(connector: impl adbx::Connect) -> adbx::Result<()> {
//! let device = Device::new(connector, "emulator-5554");
//! device.wait_ready()?;
//!
//! let out = device.shell_v2("ls /sdcard", Streams::Separate)?;
//! println!("exit {}", out.exit_code());
//!
//! for package in device.list_packages()? {
//!     println!("{package}");
//! }
//! # Ok(())
//! # }
//! ```

mod admin;
mod boot;
mod config;
mod connection;
mod device;
mod error;
#[cfg(test)]
mod fake;
mod forward;
mod packages;
pub mod parse;
mod shell;

pub use adbx_proto::{Command, Streams};
pub use admin::root_confirmed;
pub use config::DeviceConfig;
pub use connection::{Channel, Connect, Connection};
pub use device::{Device, DeviceBuilder};
pub use error::{Error, Result};
pub use parse::{Feature, Reverse};
pub use shell::ShellOutput;
