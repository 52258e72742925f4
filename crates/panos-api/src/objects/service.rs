// Service objects
//
// `service/entry` nodes: a TCP or UDP destination port set with an optional
// source port set.

use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::models::{Protocol, Service};
use crate::objects::{Element, Entries, Members, flatten, non_empty};
use crate::protocol::Verb;
use crate::session::Session;
use crate::xpath::{Category, Scope};

#[derive(Debug, Default, Deserialize)]
struct ServiceListing {
    #[serde(default)]
    service: Vec<Entries<ServiceEntry>>,
}

#[derive(Debug, Deserialize)]
struct ServiceEntry {
    #[serde(rename = "@name")]
    name: String,
    protocol: Option<ProtocolNode>,
    description: Option<String>,
    #[serde(default)]
    tag: Members,
}

#[derive(Debug, Deserialize)]
struct ProtocolNode {
    tcp: Option<Ports>,
    udp: Option<Ports>,
}

#[derive(Debug, Deserialize)]
struct Ports {
    port: Option<String>,
    #[serde(rename = "source-port")]
    source_port: Option<String>,
}

impl ServiceEntry {
    fn into_record(self) -> Option<Service> {
        let (protocol, ports) = match self.protocol {
            Some(ProtocolNode {
                tcp: Some(ports), ..
            }) => (Protocol::Tcp, ports),
            Some(ProtocolNode {
                udp: Some(ports), ..
            }) => (Protocol::Udp, ports),
            _ => {
                debug!(name = self.name, "skipping service without tcp/udp ports");
                return None;
            }
        };

        Some(Service {
            name: self.name,
            protocol,
            port: non_empty(ports.port).unwrap_or_default(),
            source_port: non_empty(ports.source_port),
            description: non_empty(self.description),
            tags: self.tag.into_vec(),
        })
    }
}

fn service_element(service: &Service) -> String {
    let protocol = service.protocol.to_string();
    Element::new()
        .open("protocol")
        .open(&protocol)
        .text("port", service.port.trim())
        .optional("source-port", service.source_port.as_deref().map(str::trim))
        .close(&protocol)
        .close("protocol")
        .optional("description", service.description.as_deref())
        .members("tag", &service.tags)
        .finish()
}

fn parse_services(listing: Option<ServiceListing>) -> Vec<Service> {
    flatten(listing.unwrap_or_default().service)
        .into_iter()
        .filter_map(ServiceEntry::into_record)
        .collect()
}

impl Session {
    pub async fn services(&self, scope: &Scope) -> Result<Vec<Service>, Error> {
        let xpath = self.resolver().listing(Category::Service, scope)?;
        debug!(%scope, "listing service objects");
        let envelope = self.config_get(&xpath).await?;
        Ok(parse_services(envelope.decode()?))
    }

    /// Create (or merge into) a service object.
    pub async fn create_service(&self, service: &Service, scope: &Scope) -> Result<(), Error> {
        let xpath = self
            .resolver()
            .entry(Category::Service, scope, &service.name)?;
        if service.port.trim().is_empty() {
            return Err(Error::config(format!(
                "service {} has no destination port",
                service.name
            )));
        }
        debug!(
            name = service.name,
            protocol = %service.protocol,
            port = service.port,
            %scope,
            "creating service object"
        );
        self.config_set(&xpath, &service_element(service)).await
    }

    pub async fn delete_service(&self, name: &str, scope: &Scope) -> Result<(), Error> {
        let xpath = self.resolver().entry(Category::Service, scope, name)?;
        debug!(name, %scope, "deleting service object");
        self.config_delete(Verb::Get, &xpath).await
    }
}
