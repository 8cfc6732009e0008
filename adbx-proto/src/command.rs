//! Host protocol request lines.

use std::fmt;

/// A request sent as the first line of a host protocol connection.
///
/// The [`Display`](fmt::Display) impl renders the exact wire string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command<'a> {
    /// Scope the connection to one device (`host:transport:<serial>`).
    Transport(&'a str),
    /// Run a command through the plain shell service.
    Shell(&'a str),
    /// Run a command through shell protocol v2.
    ShellV2(&'a str),
    /// Open the file-transfer service.
    Sync,
    /// Open a local socket or filesystem path on the device.
    ///
    /// Paths without a `scheme:` prefix get `localfilesystem:`.
    Local(&'a str),
    /// Open a device log buffer.
    Log(&'a str),
    /// Reboot the device.
    Reboot,
    /// Remount system partitions read-write.
    Remount,
    /// Restart the device daemon with root privileges.
    Root,
    /// List reverse port forwards.
    ReverseList,
    /// Forward device port `remote` to host port `local`.
    ReverseForward {
        /// Device-side endpoint, e.g. `tcp:8080`.
        remote: &'a str,
        /// Host-side endpoint, e.g. `tcp:9090`.
        local: &'a str,
    },
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(serial) => write!(f, "host:transport:{serial}"),
            Self::Shell(cmd) => write!(f, "shell:{cmd}"),
            Self::ShellV2(cmd) => write!(f, "shell,v2:{cmd}"),
            Self::Sync => f.write_str("sync:"),
            Self::Local(path) if path.contains(':') => f.write_str(path),
            Self::Local(path) => write!(f, "localfilesystem:{path}"),
            Self::Log(name) => write!(f, "log:{name}"),
            Self::Reboot => f.write_str("reboot:"),
            Self::Remount => f.write_str("remount:"),
            Self::Root => f.write_str("root:"),
            Self::ReverseList => f.write_str("reverse:list-forward"),
            Self::ReverseForward { remote, local } => {
                write!(f, "reverse:forward:{remote}:{local}")
            }
        }
    }
}
