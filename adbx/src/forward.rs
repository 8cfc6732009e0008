//! Reverse port forwarding.

use adbx_proto::Command;

use crate::Result;
use crate::connection::{Connect, Connection};
use crate::device::Device;
use crate::parse::{self, Reverse};

impl<C: Connect> Device<C> {
    /// Forwards device endpoint `remote` to host endpoint `local`.
    ///
    /// The daemon answers twice: once accepting the request, then again
    /// once the forward is in place. Both must be `OKAY`.
    pub fn reverse(&self, remote: &str, local: &str) -> Result<()> {
        let mut conn = self.open(Command::ReverseForward { remote, local }, None)?;
        conn.check_status()?;
        conn.close()
    }

    /// Lists the device's reverse forwards.
    pub fn list_reverses(&self) -> Result<Vec<Reverse>> {
        let mut conn = self.open(Command::ReverseList, None)?;
        let result = conn.receive()?;
        conn.close()?;
        parse::reverses(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::fake::{Event, FakeConnector, Reply};

    fn device(replies: impl IntoIterator<Item = Reply>) -> Device<FakeConnector> {
        Device::new(FakeConnector::new(replies), "emulator-5554")
    }

    #[test]
    fn reverse_checks_status_twice() {
        let dev = device([Reply::data("")]);
        dev.reverse("tcp:8080", "tcp:9090").unwrap();

        // Each send consumes its own acknowledgement.
        assert_eq!(
            dev.connector().events(),
            [
                Event::Send("host:transport:emulator-5554".into()),
                Event::Send("reverse:forward:tcp:8080:tcp:9090".into()),
                Event::CheckStatus,
                Event::Close,
            ]
        );
    }

    #[test]
    fn reverse_forward_rejected() {
        let dev = device([Reply::RejectStatus("cannot bind listener".into())]);
        let err = dev.reverse("tcp:80", "tcp:9090").unwrap_err();
        assert!(matches!(err, Error::Fail(m) if m == "cannot bind listener"));
        assert_eq!(dev.connector().events().last(), Some(&Event::Close));
    }

    #[test]
    fn list_reverses_parses_entries() {
        let dev = device([Reply::data(
            "emulator-5554 tcp:8080 tcp:9090\nemulator-5554 localabstract:dbg tcp:5039\n",
        )]);
        let entries = dev.list_reverses().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].remote, "localabstract:dbg");
        assert_eq!(entries[1].local, "tcp:5039");
        assert_eq!(dev.connector().sent()[1], "reverse:list-forward");
        assert_eq!(dev.connector().events().last(), Some(&Event::Close));
    }

    #[test]
    fn list_reverses_rejects_malformed_line() {
        let dev = device([Reply::data("emulator-5554 tcp:8080\n")]);
        assert!(matches!(
            dev.list_reverses(),
            Err(Error::MalformedReverse { .. })
        ));
    }

    #[test]
    fn list_reverses_empty() {
        let dev = device([Reply::data("")]);
        assert!(dev.list_reverses().unwrap().is_empty());
    }
}
