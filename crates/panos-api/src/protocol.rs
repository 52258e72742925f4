// XML API request/response protocol
//
// Every call is one HTTPS request to `https://{host}/api/` carrying `type`,
// `action`, `key`, and either `xpath`/`element` or `cmd`. Every answer is a
// `<response status=".." code="..">` document. This module builds the query,
// performs the round trip, and classifies the envelope; the typed payload is
// decoded later by the operation that asked for it.

use std::fmt;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::session::Session;

/// HTTP method for an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// A parsed `<response>` envelope.
///
/// A non-success status is not an error at this layer; callers decide via
/// [`Envelope::check`].
#[derive(Debug, Clone)]
pub struct Envelope {
    status: String,
    code: Option<String>,
    message: Option<String>,
    result_text: String,
    body: String,
}

impl Envelope {
    /// Parse a response body.
    ///
    /// Fails with [`Error::Parse`] when the body is not XML, the root element
    /// is not `<response>`, or the `status` attribute is missing.
    pub fn parse(body: String) -> Result<Self, Error> {
        let mut reader = Reader::from_str(&body);
        reader.config_mut().trim_text(true);

        let mut status = None;
        let mut code = None;
        let mut depth = 0usize;
        let mut saw_root = false;
        let mut msg_depth: Option<usize> = None;
        let mut result_depth: Option<usize> = None;
        let mut message = Vec::new();
        let mut result_text = Vec::new();

        loop {
            match reader.read_event().map_err(|e| Error::parse(e, &body))? {
                Event::Start(e) => {
                    if depth == 0 {
                        let (s, c) = root_attributes(&e, &reader, &body, &mut saw_root)?;
                        status = s;
                        code = c;
                    } else {
                        match e.name().as_ref() {
                            b"msg" if msg_depth.is_none() => msg_depth = Some(depth),
                            b"result" if result_depth.is_none() => result_depth = Some(depth),
                            _ => {}
                        }
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    if depth == 0 {
                        let (s, c) = root_attributes(&e, &reader, &body, &mut saw_root)?;
                        status = s;
                        code = c;
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if msg_depth == Some(depth) {
                        msg_depth = None;
                    }
                    if result_depth == Some(depth) {
                        result_depth = None;
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| Error::parse(e, &body))?;
                    collect(&text, msg_depth, result_depth, &mut message, &mut result_text);
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c);
                    collect(&text, msg_depth, result_depth, &mut message, &mut result_text);
                }
                Event::Eof if depth != 0 => {
                    return Err(Error::parse("truncated response", &body));
                }
                Event::Eof => break,
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
            }
        }

        let status = status.ok_or_else(|| Error::parse("response has no status attribute", &body))?;
        let message = if message.is_empty() {
            None
        } else {
            Some(message.join(" "))
        };

        Ok(Self {
            status,
            code,
            message,
            result_text: result_text.join("\n"),
            body,
        })
    }

    /// Raw `status` attribute (`success` or `error`).
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The `code` attribute, if the device sent one.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Text of the `<msg>` element, with `<line>` children joined by spaces.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// All text inside `<result>`, one line per text node.
    pub fn result_text(&self) -> &str {
        &self.result_text
    }

    /// The undecoded response body.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Turn a non-success envelope into [`Error::Operation`].
    pub fn check(self) -> Result<Self, Error> {
        if self.is_success() {
            return Ok(self);
        }
        let Self { code, message, .. } = self;
        Err(Error::operation(code.as_deref(), message))
    }

    /// Decode the `<result>` payload into a typed shape.
    ///
    /// A missing `<result>` decodes as `None`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, Error> {
        let response: Response<T> =
            quick_xml::de::from_str(&self.body).map_err(|e| Error::parse(e, &self.body))?;
        Ok(response.result)
    }
}

/// Validate the root element and read its `status` and `code` attributes.
fn root_attributes(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    body: &str,
    saw_root: &mut bool,
) -> Result<(Option<String>, Option<String>), Error> {
    if *saw_root {
        return Err(Error::parse("multiple top-level elements", body));
    }
    *saw_root = true;

    if e.name().as_ref() != b"response" {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        return Err(Error::parse(
            format!("expected <response> root, found <{name}>"),
            body,
        ));
    }

    let mut status = None;
    let mut code = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::parse(e, body))?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| Error::parse(e, body))?
            .into_owned();
        match attr.key.as_ref() {
            b"status" => status = Some(value),
            b"code" => code = Some(value),
            _ => {}
        }
    }
    Ok((status, code))
}

fn collect(
    text: &str,
    msg_depth: Option<usize>,
    result_depth: Option<usize>,
    message: &mut Vec<String>,
    result_text: &mut Vec<String>,
) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if msg_depth.is_some() {
        message.push(text.to_owned());
    }
    if result_depth.is_some() {
        result_text.push(text.to_owned());
    }
}

/// Wire shape of `<response><result>..</result></response>`.
#[derive(Debug, Deserialize)]
struct Response<T> {
    result: Option<T>,
}

// ── Transport round trip ─────────────────────────────────────────────

/// Send one request and parse the envelope.
///
/// Transport failures and unparsable bodies abort immediately; a parsed
/// envelope is returned whatever its status. PAN-OS answers some failures
/// (bad key, bad credentials) with HTTP 403 and an XML body, so the HTTP
/// status only matters when the body is not a valid envelope.
pub(crate) async fn send(
    http: &reqwest::Client,
    url: &Url,
    verb: Verb,
    params: &[(&str, &str)],
) -> Result<Envelope, Error> {
    debug!(
        %verb,
        r#type = param(params, "type"),
        action = param(params, "action"),
        xpath = param(params, "xpath"),
        cmd = param(params, "cmd"),
        "sending API request"
    );

    let builder = match verb {
        Verb::Get => http.get(url.clone()),
        Verb::Post => http.post(url.clone()),
    };
    let resp = builder.query(params).send().await.map_err(Error::Transport)?;

    let http_error = resp.error_for_status_ref().err();
    let body = resp.text().await.map_err(Error::Transport)?;
    // Keygen bodies carry the key.
    if param(params, "type") != Some("keygen") {
        trace!(body = %body, "API response");
    }

    match Envelope::parse(body) {
        Ok(envelope) => Ok(envelope),
        Err(err) => match http_error {
            Some(http_error) => Err(Error::Transport(http_error)),
            None => Err(err),
        },
    }
}

fn param<'a>(params: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
}

// ── Session-level helpers ────────────────────────────────────────────

impl Session {
    /// Execute one API call with this session's key.
    ///
    /// `params` carries `type`, `action`, `xpath`, `element`, or `cmd`; the
    /// key is appended here. The envelope is returned unchecked.
    pub async fn execute(&self, verb: Verb, params: &[(&str, &str)]) -> Result<Envelope, Error> {
        let mut query = Vec::with_capacity(params.len() + 1);
        query.extend_from_slice(params);
        query.push(("key", self.key().expose_secret()));
        send(self.http(), self.api_url(), verb, &query).await
    }

    /// `type=config&action=get` at `xpath`, checked.
    pub(crate) async fn config_get(&self, xpath: &str) -> Result<Envelope, Error> {
        self.execute(
            Verb::Get,
            &[("type", "config"), ("action", "get"), ("xpath", xpath)],
        )
        .await?
        .check()
    }

    /// `type=config&action=set`: create or merge `element` under `xpath`.
    pub(crate) async fn config_set(&self, xpath: &str, element: &str) -> Result<(), Error> {
        self.execute(
            Verb::Post,
            &[
                ("type", "config"),
                ("action", "set"),
                ("xpath", xpath),
                ("element", element),
            ],
        )
        .await?
        .check()?;
        Ok(())
    }

    /// `type=config&action=edit`: replace the node at `xpath` with `element`.
    pub(crate) async fn config_edit(&self, xpath: &str, element: &str) -> Result<(), Error> {
        self.execute(
            Verb::Post,
            &[
                ("type", "config"),
                ("action", "edit"),
                ("xpath", xpath),
                ("element", element),
            ],
        )
        .await?
        .check()?;
        Ok(())
    }

    /// `type=config&action=delete` at `xpath`.
    pub(crate) async fn config_delete(&self, verb: Verb, xpath: &str) -> Result<(), Error> {
        self.execute(
            verb,
            &[("type", "config"), ("action", "delete"), ("xpath", xpath)],
        )
        .await?
        .check()?;
        Ok(())
    }
}
