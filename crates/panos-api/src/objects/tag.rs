// Tags
//
// Tag objects themselves, and attaching/detaching tags on other objects.
// Attaching needs the target's category, which the caller doesn't supply,
// so it's found by listing each taggable category in turn.

use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::models::{Tag, TagColor};
use crate::objects::{Element, Entries, flatten, non_empty};
use crate::protocol::Verb;
use crate::session::Session;
use crate::xpath::{Category, Scope, quoted};

#[derive(Debug, Default, Deserialize)]
struct TagListing {
    #[serde(default)]
    tag: Vec<Entries<TagEntry>>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(rename = "@name")]
    name: String,
    color: Option<String>,
    comments: Option<String>,
}

impl TagEntry {
    fn into_record(self) -> Tag {
        let color = non_empty(self.color).and_then(|code| {
            let color = TagColor::from_code(&code);
            if color.is_none() {
                debug!(tag = self.name, code, "unknown tag color code");
            }
            color
        });
        Tag {
            name: self.name,
            color,
            comments: non_empty(self.comments),
        }
    }
}

fn tag_element(color: Option<TagColor>, comments: Option<&str>) -> String {
    Element::new()
        .optional("color", color.map(TagColor::code))
        .optional("comments", comments)
        .finish()
}

fn parse_tags(listing: Option<TagListing>) -> Vec<Tag> {
    flatten(listing.unwrap_or_default().tag)
        .into_iter()
        .map(TagEntry::into_record)
        .collect()
}

impl Session {
    pub async fn tags(&self, scope: &Scope) -> Result<Vec<Tag>, Error> {
        let xpath = self.resolver().listing(Category::Tag, scope)?;
        debug!(%scope, "listing tags");
        let envelope = self.config_get(&xpath).await?;
        Ok(parse_tags(envelope.decode()?))
    }

    /// Create (or merge into) a tag object.
    pub async fn create_tag(
        &self,
        name: &str,
        color: Option<TagColor>,
        comments: Option<&str>,
        scope: &Scope,
    ) -> Result<(), Error> {
        let xpath = self.resolver().entry(Category::Tag, scope, name)?;
        debug!(name, ?color, %scope, "creating tag");
        self.config_set(&xpath, &tag_element(color, comments)).await
    }

    pub async fn delete_tag(&self, name: &str, scope: &Scope) -> Result<(), Error> {
        let xpath = self.resolver().entry(Category::Tag, scope, name)?;
        debug!(name, %scope, "deleting tag");
        self.config_delete(Verb::Get, &xpath).await
    }

    /// Find which taggable category holds an object named `name`.
    ///
    /// Searches addresses, address groups, services, then service groups;
    /// the first category with a match wins even if the name also exists
    /// in a later one.
    pub async fn find_taggable(&self, name: &str, scope: &Scope) -> Result<Category, Error> {
        for category in Category::TAGGABLE {
            let found = match category {
                Category::Address => self.addresses(scope).await?.iter().any(|o| o.name == name),
                Category::AddressGroup => self
                    .address_groups(scope)
                    .await?
                    .iter()
                    .any(|o| o.name == name),
                Category::Service => self.services(scope).await?.iter().any(|o| o.name == name),
                Category::ServiceGroup => self
                    .service_groups(scope)
                    .await?
                    .iter()
                    .any(|o| o.name == name),
                Category::Tag | Category::Device | Category::DeviceGroup => false,
            };
            if found {
                debug!(name, %category, "resolved tag target");
                return Ok(category);
            }
        }
        Err(Error::NotFound {
            name: name.to_owned(),
        })
    }

    /// Attach `tags` to the object named `object`, replacing its tag list.
    pub async fn apply_tags(&self, tags: &[&str], object: &str, scope: &Scope) -> Result<(), Error> {
        // Scope and name checks before the lookup requests.
        self.resolver().entry(Category::Address, scope, object)?;
        if tags.iter().all(|t| t.trim().is_empty()) {
            return Err(Error::config("at least one tag is required"));
        }

        let category = self.find_taggable(object, scope).await?;
        let xpath = format!("{}/tag", self.resolver().entry(category, scope, object)?);
        let element = Element::new().members("tag", tags).finish();
        debug!(object, %category, ?tags, %scope, "applying tags");
        self.config_edit(&xpath, &element).await
    }

    /// Detach a single tag from the object named `object`.
    pub async fn remove_tag(&self, tag: &str, object: &str, scope: &Scope) -> Result<(), Error> {
        self.resolver().entry(Category::Address, scope, object)?;
        let tag = quoted(tag)?;

        let category = self.find_taggable(object, scope).await?;
        let xpath = format!(
            "{}/tag/member[text()='{tag}']",
            self.resolver().entry(category, scope, object)?
        );
        debug!(object, %category, tag, %scope, "removing tag");
        self.config_delete(Verb::Post, &xpath).await
    }
}
