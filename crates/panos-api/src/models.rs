// Configuration object records
//
// Value types parsed from listing responses and accepted by create
// operations. They carry no identity beyond their name (or serial) and are
// never cached: fetched, used, discarded.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

// ── Address ──────────────────────────────────────────────────────────

/// How an address object expresses its value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum AddressKind {
    /// `10.0.0.5/32`, `10.0.0.0/24`, or a bare host address.
    #[strum(serialize = "ip")]
    IpNetmask,
    /// `10.0.0.1-10.0.0.20`
    #[strum(serialize = "range")]
    IpRange,
    #[strum(serialize = "fqdn")]
    Fqdn,
}

impl AddressKind {
    /// The element name carrying the value on the wire.
    pub fn element(self) -> &'static str {
        match self {
            Self::IpNetmask => "ip-netmask",
            Self::IpRange => "ip-range",
            Self::Fqdn => "fqdn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub kind: AddressKind,
    pub value: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl Address {
    pub fn new(name: impl Into<String>, kind: AddressKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            description: None,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

// ── Address group ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressGroupKind {
    /// An explicit list of member address or group names.
    Static { members: Vec<String> },
    /// Membership computed from a tag expression such as `'web' and 'prod'`.
    Dynamic { filter: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressGroup {
    pub name: String,
    pub kind: AddressGroupKind,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl AddressGroup {
    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, AddressGroupKind::Dynamic { .. })
    }
}

// ── Service ──────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub protocol: Protocol,
    /// Destination port(s): `443`, `8080-8090`, or `80,443`.
    pub port: String,
    pub source_port: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl Service {
    pub fn new(name: impl Into<String>, protocol: Protocol, port: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol,
            port: port.into(),
            source_port: None,
            description: None,
            tags: Vec::new(),
        }
    }

    pub fn with_source_port(mut self, source_port: impl Into<String>) -> Self {
        self.source_port = Some(source_port.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGroup {
    pub name: String,
    pub members: Vec<String>,
    pub tags: Vec<String>,
}

// ── Tag ──────────────────────────────────────────────────────────────

/// The sixteen colors a tag can carry, by their GUI names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum TagColor {
    Red,
    Green,
    Blue,
    Yellow,
    Copper,
    Orange,
    Purple,
    Gray,
    #[strum(serialize = "Light Green")]
    LightGreen,
    Cyan,
    #[strum(serialize = "Light Gray")]
    LightGray,
    #[strum(serialize = "Blue Gray")]
    BlueGray,
    Lime,
    Black,
    Gold,
    Brown,
}

impl TagColor {
    /// The configuration value, `color1` through `color16`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Red => "color1",
            Self::Green => "color2",
            Self::Blue => "color3",
            Self::Yellow => "color4",
            Self::Copper => "color5",
            Self::Orange => "color6",
            Self::Purple => "color7",
            Self::Gray => "color8",
            Self::LightGreen => "color9",
            Self::Cyan => "color10",
            Self::LightGray => "color11",
            Self::BlueGray => "color12",
            Self::Lime => "color13",
            Self::Black => "color14",
            Self::Gold => "color15",
            Self::Brown => "color16",
        }
    }

    /// Reverse of [`TagColor::code`].
    pub fn from_code(code: &str) -> Option<Self> {
        Self::iter().find(|color| color.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub color: Option<TagColor>,
    pub comments: Option<String>,
}

// ── Panorama ─────────────────────────────────────────────────────────

/// A firewall registered under Panorama management.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDevice {
    pub serial: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub name: String,
    pub description: Option<String>,
    /// Serial numbers of member firewalls.
    pub devices: Vec<String>,
}
