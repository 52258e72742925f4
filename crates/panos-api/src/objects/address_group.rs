// Address groups
//
// `address-group/entry` nodes, either a static member list or a dynamic
// tag filter.

use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::models::{AddressGroup, AddressGroupKind};
use crate::objects::{Element, Entries, Members, flatten, non_empty};
use crate::protocol::Verb;
use crate::session::Session;
use crate::xpath::{Category, Scope};

#[derive(Debug, Default, Deserialize)]
struct AddressGroupListing {
    #[serde(rename = "address-group", default)]
    groups: Vec<Entries<AddressGroupEntry>>,
}

#[derive(Debug, Deserialize)]
struct AddressGroupEntry {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "static")]
    static_members: Option<Members>,
    dynamic: Option<DynamicFilter>,
    description: Option<String>,
    #[serde(default)]
    tag: Members,
}

#[derive(Debug, Deserialize)]
struct DynamicFilter {
    filter: Option<String>,
}

impl AddressGroupEntry {
    fn into_record(self) -> AddressGroup {
        let kind = match (self.dynamic.and_then(|d| non_empty(d.filter)), self.static_members) {
            (Some(filter), _) => AddressGroupKind::Dynamic { filter },
            (None, members) => AddressGroupKind::Static {
                members: members.map(Members::into_vec).unwrap_or_default(),
            },
        };
        AddressGroup {
            name: self.name,
            kind,
            description: non_empty(self.description),
            tags: self.tag.into_vec(),
        }
    }
}

fn group_element(group: &AddressGroup) -> Result<String, Error> {
    let element = match &group.kind {
        AddressGroupKind::Static { members } => {
            if members.iter().all(|m| m.trim().is_empty()) {
                return Err(Error::config(format!(
                    "static address group {} needs at least one member",
                    group.name
                )));
            }
            Element::new().members("static", members)
        }
        AddressGroupKind::Dynamic { filter } => {
            let filter = filter.trim();
            if filter.is_empty() {
                return Err(Error::config(format!(
                    "dynamic address group {} needs a filter",
                    group.name
                )));
            }
            Element::new()
                .open("dynamic")
                .text("filter", filter)
                .close("dynamic")
        }
    };
    Ok(element
        .optional("description", group.description.as_deref())
        .members("tag", &group.tags)
        .finish())
}

fn parse_address_groups(listing: Option<AddressGroupListing>) -> Vec<AddressGroup> {
    flatten(listing.unwrap_or_default().groups)
        .into_iter()
        .map(AddressGroupEntry::into_record)
        .collect()
}

impl Session {
    pub async fn address_groups(&self, scope: &Scope) -> Result<Vec<AddressGroup>, Error> {
        let xpath = self.resolver().listing(Category::AddressGroup, scope)?;
        debug!(%scope, "listing address groups");
        let envelope = self.config_get(&xpath).await?;
        Ok(parse_address_groups(envelope.decode()?))
    }

    /// Create an address group from a full record.
    ///
    /// Static groups need at least one member; dynamic groups a non-empty
    /// filter. Both are checked before any request is sent.
    pub async fn create_address_group(
        &self,
        group: &AddressGroup,
        scope: &Scope,
    ) -> Result<(), Error> {
        let xpath = self
            .resolver()
            .entry(Category::AddressGroup, scope, &group.name)?;
        let element = group_element(group)?;
        debug!(
            name = group.name,
            dynamic = group.is_dynamic(),
            %scope,
            "creating address group"
        );
        self.config_set(&xpath, &element).await
    }

    /// Create a static group from explicit member names.
    pub async fn create_static_group(
        &self,
        name: &str,
        members: &[&str],
        description: Option<&str>,
        scope: &Scope,
    ) -> Result<(), Error> {
        let group = AddressGroup {
            name: name.to_owned(),
            kind: AddressGroupKind::Static {
                members: members.iter().map(|m| (*m).to_owned()).collect(),
            },
            description: description.map(str::to_owned),
            tags: Vec::new(),
        };
        self.create_address_group(&group, scope).await
    }

    /// Create a dynamic group matching a tag expression, e.g.
    /// `'web' and 'prod'`.
    pub async fn create_dynamic_group(
        &self,
        name: &str,
        filter: &str,
        description: Option<&str>,
        scope: &Scope,
    ) -> Result<(), Error> {
        let group = AddressGroup {
            name: name.to_owned(),
            kind: AddressGroupKind::Dynamic {
                filter: filter.to_owned(),
            },
            description: description.map(str::to_owned),
            tags: Vec::new(),
        };
        self.create_address_group(&group, scope).await
    }

    pub async fn delete_address_group(&self, name: &str, scope: &Scope) -> Result<(), Error> {
        let xpath = self.resolver().entry(Category::AddressGroup, scope, name)?;
        debug!(name, %scope, "deleting address group");
        self.config_delete(Verb::Get, &xpath).await
    }
}
