//! Daemon administration: root, remount, reboot.

use adbx_proto::Command;

use crate::connection::{Connect, Connection};
use crate::device::Device;
use crate::{Error, Result};

/// Reply the daemon prints when it agrees to restart as root.
const ROOT_CONFIRMATION: &str = "restarting adbd as root";

impl<C: Connect> Device<C> {
    /// Restarts the device daemon as root.
    ///
    /// Fails with [`Error::Root`] carrying the daemon's reply if it does
    /// not confirm the restart (e.g. production builds).
    pub fn root(&self) -> Result<()> {
        let mut conn = self.open(Command::Root, None)?;
        let result = String::from_utf8(conn.read_all()?)?;
        conn.close()?;
        if root_confirmed(&result) {
            Ok(())
        } else {
            Err(Error::Root(result.trim().to_owned()))
        }
    }

    /// Remounts system partitions read-write.
    pub fn remount(&self) -> Result<()> {
        self.open(Command::Remount, None)?.close()
    }

    /// Reboots the device.
    pub fn reboot(&self) -> Result<()> {
        let mut conn = self.open(Command::Reboot, None)?;
        conn.read_all()?;
        conn.close()
    }
}

/// Whether a `root:` reply confirms the restart.
pub fn root_confirmed(reply: &str) -> bool {
    reply.contains(ROOT_CONFIRMATION)
}
