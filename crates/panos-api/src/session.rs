// Session bootstrap
//
// A session is created by a three-request handshake: keygen, system info,
// and Panorama connection status. The result is immutable; there is no
// server-side logout, so dropping the session is the end of it.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::protocol::{self, Verb};
use crate::transport::{self, TransportConfig};
use crate::xpath::{DeviceType, Resolver};

const SHOW_SYSTEM_INFO: &str = "<show><system><info></info></system></show>";
const SHOW_PANORAMA_STATUS: &str = "<show><panorama-status></panorama-status></show>";

/// Marker in the `show panorama-status` text meaning the firewall is connected.
const PANORAMA_CONNECTED: &str = ": yes";

/// Everything needed to open a session.
///
/// Built by `panos-config` from a profile, or by hand.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Management host, optionally with a port.
    pub host: String,
    pub username: String,
    pub password: SecretString,
    pub transport: TransportConfig,
}

/// A PAN-OS release number parsed from `sw-version` (`10.2.4-h3` → 10.2.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SoftwareVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SoftwareVersion {
    /// Parse the leading `major.minor.patch` of a version string.
    pub fn parse(version: &str) -> Option<Self> {
        let numeric = version
            .trim()
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()?;
        let mut parts = numeric.split('.').map(str::parse::<u32>);
        let major = parts.next()?.ok()?;
        let minor = parts.next()?.ok()?;
        let patch = parts.next()?.ok()?;
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// An authenticated connection to one firewall or Panorama.
///
/// Immutable after [`Session::connect`]; safe to share behind an `Arc` and
/// use from several tasks, since every operation builds its own request.
#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    host: String,
    api_url: Url,
    key: SecretString,
    platform_family: String,
    model: String,
    serial: String,
    software_version: String,
    device_type: DeviceType,
    managed_by_panorama: bool,
}

// ── Handshake wire shapes ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct KeygenResult {
    key: String,
}

#[derive(Debug, Deserialize)]
struct SystemInfoResult {
    system: SystemInfo,
}

#[derive(Debug, Default, Deserialize)]
struct SystemInfo {
    #[serde(rename = "platform-family", default)]
    platform_family: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    serial: String,
    #[serde(rename = "sw-version", default)]
    sw_version: String,
}

impl Session {
    /// Open a session from a [`ConnectConfig`].
    pub async fn connect(config: &ConnectConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        let api_url = transport::api_url(&config.host)?;
        Self::connect_with(http, api_url, &config.username, &config.password).await
    }

    /// Open a session against an explicit API endpoint with a pre-built client.
    ///
    /// `api_url` is the full endpoint, e.g. `https://fw01/api/`.
    pub async fn connect_with(
        http: reqwest::Client,
        api_url: Url,
        username: &str,
        password: &SecretString,
    ) -> Result<Self, Error> {
        let host = host_of(&api_url)?;
        debug!(host, username, "generating API key");

        let key = keygen(&http, &api_url, username, password).await?;
        let info = system_info(&http, &api_url, &key).await?;
        let managed_by_panorama = panorama_status(&http, &api_url, &key).await?;
        let device_type = DeviceType::from_platform_family(&info.platform_family);

        debug!(
            host,
            %device_type,
            model = info.model,
            serial = info.serial,
            version = info.sw_version,
            managed_by_panorama,
            "session established"
        );

        Ok(Self {
            http,
            host,
            api_url,
            key,
            platform_family: info.platform_family,
            model: info.model,
            serial: info.serial,
            software_version: info.sw_version,
            device_type,
            managed_by_panorama,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The XML API endpoint, `https://{host}/api/`.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn key(&self) -> &SecretString {
        &self.key
    }

    pub fn platform_family(&self) -> &str {
        &self.platform_family
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// The raw `sw-version` string.
    pub fn software_version(&self) -> &str {
        &self.software_version
    }

    /// The parsed release, if `sw-version` has the usual shape.
    pub fn release(&self) -> Option<SoftwareVersion> {
        SoftwareVersion::parse(&self.software_version)
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    pub fn is_panorama(&self) -> bool {
        self.device_type == DeviceType::Panorama
    }

    /// Whether this firewall reports a live connection to a Panorama.
    pub fn managed_by_panorama(&self) -> bool {
        self.managed_by_panorama
    }

    /// XPath resolver for this session's device type.
    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.device_type, self.managed_by_panorama)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fail with [`Error::Config`] unless connected to Panorama.
    pub(crate) fn require_panorama(&self, operation: &str) -> Result<(), Error> {
        if self.is_panorama() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "{operation} requires a Panorama connection"
            )))
        }
    }
}

fn host_of(api_url: &Url) -> Result<String, Error> {
    let host = api_url
        .host_str()
        .ok_or_else(|| Error::config(format!("API URL {api_url} has no host")))?;
    Ok(match api_url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    })
}

/// `type=keygen`: exchange credentials for an API key.
async fn keygen(
    http: &reqwest::Client,
    api_url: &Url,
    username: &str,
    password: &SecretString,
) -> Result<SecretString, Error> {
    let envelope = protocol::send(
        http,
        api_url,
        Verb::Get,
        &[
            ("type", "keygen"),
            ("user", username),
            ("password", password.expose_secret()),
        ],
    )
    .await?;

    if !envelope.is_success() {
        let code = envelope.code().unwrap_or_default().to_owned();
        let message = envelope
            .message()
            .map_or_else(|| crate::error::describe_code(&code).to_owned(), str::to_owned);
        return Err(Error::Authentication { code, message });
    }

    let result: KeygenResult = envelope
        .decode()?
        .ok_or_else(|| Error::parse("keygen response has no result", envelope.body()))?;
    Ok(SecretString::from(result.key))
}

/// `show system info`: platform family, model, serial, and software version.
async fn system_info(
    http: &reqwest::Client,
    api_url: &Url,
    key: &SecretString,
) -> Result<SystemInfo, Error> {
    let envelope = protocol::send(
        http,
        api_url,
        Verb::Get,
        &[
            ("type", "op"),
            ("cmd", SHOW_SYSTEM_INFO),
            ("key", key.expose_secret()),
        ],
    )
    .await?;

    if !envelope.is_success() {
        let code = envelope.code().unwrap_or_default().to_owned();
        let message = crate::error::describe_code(&code).to_owned();
        return Err(Error::Protocol {
            command: "show system info",
            code,
            message,
        });
    }

    let result: SystemInfoResult = envelope
        .decode()?
        .ok_or_else(|| Error::parse("system info response has no result", envelope.body()))?;
    Ok(result.system)
}

/// `show panorama-status`: whether a Panorama manages this device.
///
/// Panorama itself answers with an error status; that, or any result
/// without the connected marker, means "not managed".
async fn panorama_status(
    http: &reqwest::Client,
    api_url: &Url,
    key: &SecretString,
) -> Result<bool, Error> {
    let envelope = protocol::send(
        http,
        api_url,
        Verb::Get,
        &[
            ("type", "op"),
            ("cmd", SHOW_PANORAMA_STATUS),
            ("key", key.expose_secret()),
        ],
    )
    .await?;

    if !envelope.is_success() {
        debug!(code = envelope.code(), "panorama-status not available");
        return Ok(false);
    }

    let connected = envelope.result_text().contains(PANORAMA_CONNECTED);
    if !connected && !envelope.result_text().is_empty() {
        warn!("panorama-status returned no connected marker; treating as unmanaged");
    }
    Ok(connected)
}
