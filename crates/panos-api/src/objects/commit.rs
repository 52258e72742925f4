// Commits
//
// Both calls return once the device has queued the commit job; job
// progress is not tracked.

use tracing::debug;

use crate::error::Error;
use crate::objects::Element;
use crate::protocol::Verb;
use crate::session::Session;
use crate::xpath::quoted;

const COMMIT: &str = "<commit></commit>";

/// `<commit-all>` body pushing a device-group, optionally to specific devices.
fn commit_all_cmd(group: &str, serials: &[&str]) -> String {
    let mut element = Element::new()
        .open("commit-all")
        .open("shared-policy")
        .open("device-group");
    if serials.is_empty() {
        element = element.named_entry(group);
    } else {
        element = element.text("name", group).open("devices");
        for serial in serials {
            element = element.named_entry(serial);
        }
        element = element.close("devices");
    }
    element
        .close("device-group")
        .close("shared-policy")
        .close("commit-all")
        .finish()
}

impl Session {
    /// Commit the candidate configuration.
    pub async fn commit(&self) -> Result<(), Error> {
        debug!(host = self.host(), "committing configuration");
        self.execute(Verb::Get, &[("type", "commit"), ("cmd", COMMIT)])
            .await?
            .check()?;
        Ok(())
    }

    /// Push a device-group's configuration from Panorama to its devices,
    /// or only to `serials` when given.
    pub async fn commit_all(&self, group: &str, serials: &[&str]) -> Result<(), Error> {
        self.require_panorama("commit-all")?;
        quoted(group)?;
        let cmd = commit_all_cmd(group, serials);
        debug!(group, devices = serials.len(), "pushing device-group configuration");
        self.execute(
            Verb::Get,
            &[("type", "commit"), ("action", "all"), ("cmd", cmd.as_str())],
        )
        .await?
        .check()?;
        Ok(())
    }
}
