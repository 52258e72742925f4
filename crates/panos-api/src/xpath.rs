// XPath resolution
//
// Pure mapping from (device type, scope, category, name) to the XPath of a
// node in the device configuration tree. No I/O: every object operation
// resolves its locator here before any request is built, so precondition
// failures surface as `Error::Config` without touching the network.

use std::fmt;

use strum::Display;

use crate::error::Error;

/// The local device entry every PAN-OS config tree is rooted at.
pub const DEVICE: &str = "/config/devices/entry[@name='localhost.localdomain']";

/// The default virtual system on a standalone firewall.
pub const VSYS: &str = "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']";

/// Descendant-axis base for listing objects pushed from a managing Panorama.
const PANORAMA_PUSHED: &str = "/config/panorama/";

/// Descendant-axis base for listing every object on a Panorama.
const ALL_DEVICES: &str = "/config/devices/entry/";

const SHARED: &str = "/config/shared";

const MANAGED_DEVICES: &str = "/config/mgt-config/devices";

/// Whether the session talks to a firewall or to a Panorama.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceType {
    /// A firewall running PAN-OS (hardware or VM-Series).
    Standalone,
    /// A Panorama management server.
    Panorama,
}

impl DeviceType {
    /// Classify from the `platform-family` reported by `show system info`.
    ///
    /// Panorama reports `m` (M-series and virtual Panorama alike).
    pub fn from_platform_family(family: &str) -> Self {
        if family == "m" {
            Self::Panorama
        } else {
            Self::Standalone
        }
    }
}

/// Where in the configuration tree an object lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// The firewall's own vsys. On Panorama this is only valid for
    /// listings, where it means "every object on the device".
    #[default]
    Local,
    /// A Panorama device-group.
    DeviceGroup(String),
    /// Panorama shared objects.
    Shared,
}

impl Scope {
    pub fn device_group(name: impl Into<String>) -> Self {
        Self::DeviceGroup(name.into())
    }

    /// The device-group name, if this scope has one.
    pub fn group(&self) -> Option<&str> {
        match self {
            Self::DeviceGroup(name) => Some(name),
            Self::Local | Self::Shared => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::DeviceGroup(name) => write!(f, "device-group {name}"),
            Self::Shared => f.write_str("shared"),
        }
    }
}

/// Kind of configuration node a locator points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Category {
    Address,
    AddressGroup,
    Service,
    ServiceGroup,
    Tag,
    /// A device registered under Panorama management.
    Device,
    DeviceGroup,
}

impl Category {
    /// Taggable categories, in the order a name lookup searches them.
    pub const TAGGABLE: [Self; 4] = [
        Self::Address,
        Self::AddressGroup,
        Self::Service,
        Self::ServiceGroup,
    ];

    /// Objects that live under a vsys, device-group, or the shared tree.
    fn is_scoped_object(self) -> bool {
        !matches!(self, Self::Device | Self::DeviceGroup)
    }
}

/// Resolves configuration locators for one session's device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver {
    device_type: DeviceType,
    managed_by_panorama: bool,
}

impl Resolver {
    pub fn new(device_type: DeviceType, managed_by_panorama: bool) -> Self {
        Self {
            device_type,
            managed_by_panorama,
        }
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Resolve the XPath for `category` in `scope`.
    ///
    /// With `name` the locator addresses a single entry; without it the
    /// locator addresses the whole collection (a listing). Listings are more
    /// permissive: a Panorama listing without a device-group walks every
    /// device-group, whereas an entry always needs one.
    pub fn resolve(
        &self,
        category: Category,
        scope: &Scope,
        name: Option<&str>,
    ) -> Result<String, Error> {
        if category.is_scoped_object() {
            self.object(category, scope, name)
        } else {
            self.panorama_node(category, scope, name)
        }
    }

    /// Shorthand for a single-entry locator.
    pub fn entry(&self, category: Category, scope: &Scope, name: &str) -> Result<String, Error> {
        self.resolve(category, scope, Some(name))
    }

    /// Shorthand for a collection locator.
    pub fn listing(&self, category: Category, scope: &Scope) -> Result<String, Error> {
        self.resolve(category, scope, None)
    }

    /// Where the Panorama server address of a firewall is configured.
    pub fn panorama_server(&self) -> Result<String, Error> {
        match self.device_type {
            DeviceType::Standalone => Ok(format!("{DEVICE}/deviceconfig/system")),
            DeviceType::Panorama => Err(Error::config(
                "a Panorama server can only be configured on a firewall",
            )),
        }
    }

    fn object(&self, category: Category, scope: &Scope, name: Option<&str>) -> Result<String, Error> {
        let base = self.object_base(scope, name.is_none())?;
        let collection = format!("{base}/{category}");
        match name {
            Some(name) => Ok(format!("{collection}/entry[@name='{}']", quoted(name)?)),
            None => Ok(collection),
        }
    }

    fn object_base(&self, scope: &Scope, listing: bool) -> Result<String, Error> {
        let base = match (self.device_type, scope) {
            (DeviceType::Standalone, Scope::Local) if listing && self.managed_by_panorama => {
                PANORAMA_PUSHED.to_owned()
            }
            (DeviceType::Standalone, Scope::Local) => VSYS.to_owned(),
            (DeviceType::Standalone, Scope::DeviceGroup(_)) => {
                return Err(Error::config(
                    "a device-group can only be specified when connected to Panorama",
                ));
            }
            (DeviceType::Standalone, Scope::Shared) => {
                return Err(Error::config(
                    "shared objects are only available when connected to Panorama",
                ));
            }
            (DeviceType::Panorama, Scope::Local) if listing => ALL_DEVICES.to_owned(),
            (DeviceType::Panorama, Scope::Local) => {
                return Err(Error::config("device-group required"));
            }
            (DeviceType::Panorama, Scope::DeviceGroup(group)) => device_group_entry(group)?,
            (DeviceType::Panorama, Scope::Shared) => SHARED.to_owned(),
        };
        Ok(base)
    }

    /// Managed devices, device-groups, and device-group membership.
    fn panorama_node(
        &self,
        category: Category,
        scope: &Scope,
        name: Option<&str>,
    ) -> Result<String, Error> {
        if self.device_type != DeviceType::Panorama {
            return Err(Error::config(format!(
                "{category} operations require a Panorama connection"
            )));
        }

        match (category, scope, name) {
            (Category::Device, Scope::Local, None) => Ok(MANAGED_DEVICES.to_owned()),
            (Category::Device, Scope::Local, Some(serial)) => {
                Ok(format!("{MANAGED_DEVICES}/entry[@name='{}']", quoted(serial)?))
            }
            (Category::Device, Scope::DeviceGroup(group), None) => {
                Ok(format!("{}/devices", device_group_entry(group)?))
            }
            (Category::Device, Scope::DeviceGroup(group), Some(serial)) => Ok(format!(
                "{}/devices/entry[@name='{}']",
                device_group_entry(group)?,
                quoted(serial)?
            )),
            (Category::DeviceGroup, Scope::Local, None) => Ok(format!("{ALL_DEVICES}/device-group")),
            (Category::DeviceGroup, Scope::Local, Some(group)) => device_group_entry(group),
            (_, scope, _) => Err(Error::config(format!(
                "{category} cannot be resolved in {scope} scope"
            ))),
        }
    }
}

/// The container every device-group entry is created under.
pub(crate) fn device_group_root() -> String {
    format!("{DEVICE}/device-group")
}

fn device_group_entry(group: &str) -> Result<String, Error> {
    Ok(format!("{}/entry[@name='{}']", device_group_root(), quoted(group)?))
}

/// Validate a value destined for a quoted XPath predicate.
///
/// Predicates are single-quoted and XPath 1.0 has no escape for `'`, so a
/// name containing one cannot be addressed.
pub(crate) fn quoted(value: &str) -> Result<&str, Error> {
    if value.is_empty() {
        return Err(Error::config("name must not be empty"));
    }
    if value.contains('\'') {
        return Err(Error::config(format!(
            "name {value:?} contains a single quote and cannot be addressed"
        )));
    }
    Ok(value)
}
