// Panorama device management
//
// Managed firewalls (`mgt-config/devices`), device-groups and their
// membership, plus pointing a firewall at its Panorama.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::models::{DeviceGroup, ManagedDevice};
use crate::objects::{Element, Entries, flatten, non_empty};
use crate::protocol::Verb;
use crate::session::Session;
use crate::xpath::{Category, Scope, device_group_root, quoted};

/// Pause between registering a device and adding it to a device-group.
const GROUP_ATTACH_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Default, Deserialize)]
struct DeviceListing {
    #[serde(default)]
    devices: Vec<Entries<NamedEntry>>,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct DeviceGroupListing {
    #[serde(rename = "device-group", default)]
    groups: Vec<Entries<DeviceGroupEntry>>,
}

#[derive(Debug, Deserialize)]
struct DeviceGroupEntry {
    #[serde(rename = "@name")]
    name: String,
    description: Option<String>,
    devices: Option<Entries<NamedEntry>>,
}

fn parse_devices(listing: Option<DeviceListing>) -> Vec<ManagedDevice> {
    flatten(listing.unwrap_or_default().devices)
        .into_iter()
        .map(|entry| ManagedDevice { serial: entry.name })
        .collect()
}

fn parse_device_groups(listing: Option<DeviceGroupListing>) -> Vec<DeviceGroup> {
    flatten(listing.unwrap_or_default().groups)
        .into_iter()
        .map(|entry| DeviceGroup {
            name: entry.name,
            description: non_empty(entry.description),
            devices: entry
                .devices
                .map(|d| d.entry.into_iter().map(|e| e.name).collect())
                .unwrap_or_default(),
        })
        .collect()
}

/// Append `<devices><entry name="S"/>...</devices>`.
fn with_devices(element: Element, serials: &[&str]) -> Element {
    serials
        .iter()
        .fold(element.open("devices"), |element, serial| {
            element.named_entry(serial)
        })
        .close("devices")
}

fn device_group_element(name: &str, description: Option<&str>, serials: &[&str]) -> String {
    let mut element = Element::new().open_entry(name);
    if !serials.is_empty() {
        element = with_devices(element, serials);
    }
    element
        .optional("description", description)
        .close("entry")
        .finish()
}

impl Session {
    // ── Managed devices ──────────────────────────────────────────────

    /// Firewalls registered on this Panorama.
    pub async fn devices(&self) -> Result<Vec<ManagedDevice>, Error> {
        let xpath = self.resolver().listing(Category::Device, &Scope::Local)?;
        debug!("listing managed devices");
        let envelope = self.config_get(&xpath).await?;
        Ok(parse_devices(envelope.decode()?))
    }

    /// Register a firewall by serial, optionally adding it to a device-group.
    ///
    /// With a group this is two requests, registration then membership, with
    /// a short fixed pause between them. A failure in the second leaves the
    /// device registered.
    pub async fn add_device(&self, serial: &str, group: Option<&str>) -> Result<(), Error> {
        self.require_panorama("adding a device")?;
        let resolver = self.resolver();
        let register = resolver.listing(Category::Device, &Scope::Local)?;
        quoted(serial)?;
        let membership = group
            .map(|g| resolver.entry(Category::DeviceGroup, &Scope::Local, g))
            .transpose()?;

        debug!(serial, ?group, "registering device");
        let entry = Element::new().named_entry(serial).finish();
        self.config_set(&register, &entry).await?;

        if let Some(membership) = membership {
            tokio::time::sleep(GROUP_ATTACH_DELAY).await;
            debug!(serial, ?group, "adding device to device-group");
            let element = with_devices(Element::new(), &[serial]).finish();
            self.config_set(&membership, &element).await?;
        }
        Ok(())
    }

    /// Unregister a firewall, or with `group`, only remove it from that
    /// device-group.
    pub async fn remove_device(&self, serial: &str, group: Option<&str>) -> Result<(), Error> {
        self.require_panorama("removing a device")?;
        let scope = group.map_or(Scope::Local, Scope::device_group);
        let xpath = self.resolver().entry(Category::Device, &scope, serial)?;
        debug!(serial, ?group, "removing device");
        self.config_delete(Verb::Post, &xpath).await
    }

    // ── Device-groups ────────────────────────────────────────────────

    pub async fn device_groups(&self) -> Result<Vec<DeviceGroup>, Error> {
        let xpath = self
            .resolver()
            .listing(Category::DeviceGroup, &Scope::Local)?;
        debug!("listing device-groups");
        let envelope = self.config_get(&xpath).await?;
        Ok(parse_device_groups(envelope.decode()?))
    }

    /// Create a device-group, optionally with initial member serials.
    pub async fn create_device_group(
        &self,
        name: &str,
        description: Option<&str>,
        serials: &[&str],
    ) -> Result<(), Error> {
        self.require_panorama("creating a device-group")?;
        quoted(name)?;
        for serial in serials {
            quoted(serial)?;
        }
        debug!(name, devices = serials.len(), "creating device-group");
        let element = device_group_element(name, description, serials);
        self.config_set(&device_group_root(), &element).await
    }

    pub async fn delete_device_group(&self, name: &str) -> Result<(), Error> {
        let xpath = self
            .resolver()
            .entry(Category::DeviceGroup, &Scope::Local, name)?;
        debug!(name, "deleting device-group");
        self.config_delete(Verb::Post, &xpath).await
    }

    // ── Firewall side ────────────────────────────────────────────────

    /// Point this firewall at a Panorama server.
    pub async fn set_panorama_server(&self, address: &str) -> Result<(), Error> {
        let xpath = self.resolver().panorama_server()?;
        if address.trim().is_empty() {
            return Err(Error::config("Panorama server address must not be empty"));
        }
        debug!(address, "setting Panorama server");
        let element = Element::new().text("panorama-server", address.trim()).finish();
        self.config_set(&xpath, &element).await
    }
}
