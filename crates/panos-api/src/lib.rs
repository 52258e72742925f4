// panos-api: Async Rust client for the PAN-OS and Panorama XML API

pub mod error;
pub mod models;
pub mod objects;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod xpath;

pub use error::{Error, describe_code, error_message};
pub use models::{
    Address, AddressGroup, AddressGroupKind, AddressKind, DeviceGroup, ManagedDevice, Protocol,
    Service, ServiceGroup, Tag, TagColor,
};
pub use protocol::{Envelope, Verb};
pub use session::{ConnectConfig, Session, SoftwareVersion};
pub use transport::{TlsMode, TransportConfig};
pub use xpath::{Category, DeviceType, Resolver, Scope};
