//! Package manager and property queries.

use std::collections::BTreeMap;

use crate::connection::Connect;
use crate::device::Device;
use crate::parse::{self, Feature};
use crate::{Error, Result};

impl<C: Connect> Device<C> {
    /// Clears all data of `package` with `pm clear`.
    ///
    /// Fails with [`Error::Clear`] unless the output reports `Success`
    /// before any `Failed`.
    pub fn clear(&self, package: &str) -> Result<()> {
        let result = self.shell(&format!("pm clear {package}"))?;
        if clear_succeeded(&result) {
            return Ok(());
        }
        self.span()
            .in_scope(|| tracing::error!(package, output = %result, "pm clear failed"));
        Err(Error::Clear {
            package: package.to_owned(),
            message: result.trim().to_owned(),
        })
    }

    /// Lists system features from `pm list features`.
    pub fn list_features(&self) -> Result<BTreeMap<String, Feature>> {
        let result = self.shell("pm list features 2>/dev/null")?;
        Ok(parse::features(&result))
    }

    /// Lists installed packages from `pm list packages`.
    pub fn list_packages(&self) -> Result<Vec<String>> {
        let result = self.shell("pm list packages 2>/dev/null")?;
        Ok(parse::packages(&result))
    }

    /// Dumps all system properties from `getprop`.
    pub fn get_properties(&self) -> Result<BTreeMap<String, String>> {
        let result = self.shell("getprop")?;
        Ok(parse::properties(&result))
    }
}

/// Whether the first status word in `pm clear` output is `Success`.
fn clear_succeeded(output: &str) -> bool {
    match (output.find("Success"), output.find("Failed")) {
        (Some(ok), Some(failed)) => ok < failed,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
