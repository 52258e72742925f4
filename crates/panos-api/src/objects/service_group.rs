// Service groups

use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::models::ServiceGroup;
use crate::objects::{Element, Entries, Members, flatten};
use crate::protocol::Verb;
use crate::session::Session;
use crate::xpath::{Category, Scope};

#[derive(Debug, Default, Deserialize)]
struct ServiceGroupListing {
    #[serde(rename = "service-group", default)]
    groups: Vec<Entries<ServiceGroupEntry>>,
}

#[derive(Debug, Deserialize)]
struct ServiceGroupEntry {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default)]
    members: Members,
    #[serde(default)]
    tag: Members,
}

fn service_group_element(group: &ServiceGroup) -> Result<String, Error> {
    if group.members.iter().all(|m| m.trim().is_empty()) {
        return Err(Error::config(format!(
            "service group {} needs at least one member",
            group.name
        )));
    }
    Ok(Element::new()
        .members("members", &group.members)
        .members("tag", &group.tags)
        .finish())
}

fn parse_service_groups(listing: Option<ServiceGroupListing>) -> Vec<ServiceGroup> {
    flatten(listing.unwrap_or_default().groups)
        .into_iter()
        .map(|entry| ServiceGroup {
            name: entry.name,
            members: entry.members.into_vec(),
            tags: entry.tag.into_vec(),
        })
        .collect()
}

impl Session {
    pub async fn service_groups(&self, scope: &Scope) -> Result<Vec<ServiceGroup>, Error> {
        let xpath = self.resolver().listing(Category::ServiceGroup, scope)?;
        debug!(%scope, "listing service groups");
        let envelope = self.config_get(&xpath).await?;
        Ok(parse_service_groups(envelope.decode()?))
    }

    /// Create a service group from member service (or group) names.
    pub async fn create_service_group(
        &self,
        name: &str,
        members: &[&str],
        scope: &Scope,
    ) -> Result<(), Error> {
        let xpath = self.resolver().entry(Category::ServiceGroup, scope, name)?;
        let group = ServiceGroup {
            name: name.to_owned(),
            members: members.iter().map(|m| (*m).to_owned()).collect(),
            tags: Vec::new(),
        };
        let element = service_group_element(&group)?;
        debug!(name, members = members.len(), %scope, "creating service group");
        self.config_set(&xpath, &element).await
    }

    pub async fn delete_service_group(&self, name: &str, scope: &Scope) -> Result<(), Error> {
        let xpath = self.resolver().entry(Category::ServiceGroup, scope, name)?;
        debug!(name, %scope, "deleting service group");
        self.config_delete(Verb::Get, &xpath).await
    }
}
