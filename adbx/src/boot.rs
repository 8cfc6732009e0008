//! Waiting for a device to finish booting.

use std::thread;
use std::time::{Duration, Instant};

use crate::connection::Connect;
use crate::device::Device;
use crate::{Error, Result};

/// Property query polled while waiting.
const BOOT_QUERY: &str = "getprop sys.boot_completed";

impl<C: Connect> Device<C> {
    /// Polls `sys.boot_completed` until it reads `1`.
    ///
    /// Transient failures (refused connections, `FAIL` replies) are logged
    /// and retried at once. Any other reply sleeps `interval` before the
    /// next poll. Fails with [`Error::Timeout`] once `timeout` has elapsed
    /// since the call.
    pub fn wait_boot_complete(&self, timeout: Duration, interval: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.shell(BOOT_QUERY) {
                Ok(value) if value.trim() == "1" => {
                    self.span().in_scope(|| tracing::info!("boot completed"));
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    self.span()
                        .in_scope(|| tracing::warn!(error = %e, "boot query failed"));
                    if Instant::now() > deadline {
                        return Err(Error::Timeout);
                    }
                    continue;
                }
                Err(e) => return Err(e),
            }
            if Instant::now() > deadline {
                return Err(Error::Timeout);
            }
            thread::sleep(interval);
        }
    }

    /// [`Device::wait_boot_complete`] with the configured timeout and
    /// interval.
    pub fn wait_ready(&self) -> Result<()> {
        let config = self.config();
        self.wait_boot_complete(config.boot_timeout(), config.boot_poll_interval())
    }
}
