// Address objects
//
// `address/entry` nodes: a single IP/netmask, IP range, or FQDN per entry.

use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::models::{Address, AddressKind};
use crate::objects::{Element, Entries, Members, flatten, non_empty};
use crate::protocol::Verb;
use crate::session::Session;
use crate::xpath::{Category, Scope};

#[derive(Debug, Default, Deserialize)]
struct AddressListing {
    #[serde(default)]
    address: Vec<Entries<AddressEntry>>,
}

#[derive(Debug, Deserialize)]
struct AddressEntry {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "ip-netmask")]
    ip_netmask: Option<String>,
    #[serde(rename = "ip-range")]
    ip_range: Option<String>,
    fqdn: Option<String>,
    description: Option<String>,
    #[serde(default)]
    tag: Members,
}

impl AddressEntry {
    /// `None` for value shapes we don't model (`ip-wildcard`).
    fn into_record(self) -> Option<Address> {
        let (kind, value) = if let Some(v) = non_empty(self.ip_netmask) {
            (AddressKind::IpNetmask, v)
        } else if let Some(v) = non_empty(self.ip_range) {
            (AddressKind::IpRange, v)
        } else if let Some(v) = non_empty(self.fqdn) {
            (AddressKind::Fqdn, v)
        } else {
            debug!(name = self.name, "skipping address with unsupported value type");
            return None;
        };

        Some(Address {
            name: self.name,
            kind,
            value,
            description: non_empty(self.description),
            tags: self.tag.into_vec(),
        })
    }
}

/// The `element` body for an address entry.
fn address_element(address: &Address) -> String {
    Element::new()
        .text(address.kind.element(), address.value.trim())
        .optional("description", address.description.as_deref())
        .members("tag", &address.tags)
        .finish()
}

fn parse_addresses(listing: Option<AddressListing>) -> Vec<Address> {
    flatten(listing.unwrap_or_default().address)
        .into_iter()
        .filter_map(AddressEntry::into_record)
        .collect()
}

impl Session {
    /// List address objects in `scope`.
    ///
    /// On Panorama, `Scope::Local` lists the objects of every device-group.
    pub async fn addresses(&self, scope: &Scope) -> Result<Vec<Address>, Error> {
        let xpath = self.resolver().listing(Category::Address, scope)?;
        debug!(%scope, "listing address objects");
        let envelope = self.config_get(&xpath).await?;
        Ok(parse_addresses(envelope.decode()?))
    }

    /// Create (or merge into) an address object.
    pub async fn create_address(&self, address: &Address, scope: &Scope) -> Result<(), Error> {
        let xpath = self
            .resolver()
            .entry(Category::Address, scope, &address.name)?;
        if address.value.trim().is_empty() {
            return Err(Error::config(format!(
                "address {} has no value",
                address.name
            )));
        }
        debug!(name = address.name, kind = %address.kind, %scope, "creating address object");
        self.config_set(&xpath, &address_element(address)).await
    }

    pub async fn delete_address(&self, name: &str, scope: &Scope) -> Result<(), Error> {
        let xpath = self.resolver().entry(Category::Address, scope, name)?;
        debug!(name, %scope, "deleting address object");
        self.config_delete(Verb::Get, &xpath).await
    }
}
