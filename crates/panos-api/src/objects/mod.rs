// Object operations
//
// One file per object kind, each adding inherent methods to `Session`.
// Every operation follows the same path: resolve the locator (which checks
// role/scope preconditions), build the element body, make one call, and
// decode or check the envelope.

pub mod address;
pub mod address_group;
pub mod commit;
pub mod device;
pub mod service;
pub mod service_group;
pub mod tag;

use std::fmt::Write as _;

use quick_xml::escape::escape;
use serde::Deserialize;

/// A `<container><entry/>...</container>` collection.
#[derive(Debug, Deserialize)]
pub(crate) struct Entries<E> {
    #[serde(default = "Vec::new")]
    entry: Vec<E>,
}

/// Flatten one or more collections into their entries.
///
/// Descendant-axis listings (`//address`) return one container per
/// vsys or device-group.
pub(crate) fn flatten<E>(containers: Vec<Entries<E>>) -> Vec<E> {
    containers.into_iter().flat_map(|c| c.entry).collect()
}

/// A `<member>` list such as `<tag>` or `<static>`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Members {
    #[serde(default)]
    member: Vec<String>,
}

impl Members {
    pub(crate) fn into_vec(self) -> Vec<String> {
        self.member
            .into_iter()
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
            .collect()
    }
}

/// Treat an empty or whitespace-only element as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Builder for the `element` parameter of set/edit calls.
///
/// Text and attribute values are escaped; tag names are trusted literals.
#[derive(Debug, Default)]
pub(crate) struct Element {
    xml: String,
}

impl Element {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `<tag>value</tag>`
    pub(crate) fn text(mut self, tag: &str, value: &str) -> Self {
        // Writing to a String cannot fail.
        let _ = write!(self.xml, "<{tag}>{}</{tag}>", escape(value));
        self
    }

    /// `<tag>value</tag>` when `value` is present and non-empty.
    pub(crate) fn optional(self, tag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) if !value.is_empty() => self.text(tag, value),
            _ => self,
        }
    }

    /// `<tag><member>a</member>...</tag>`; nothing when every member is blank.
    pub(crate) fn members<S: AsRef<str>>(mut self, tag: &str, members: &[S]) -> Self {
        if members.iter().all(|m| m.as_ref().trim().is_empty()) {
            return self;
        }
        self = self.open(tag);
        for member in members.iter().map(|m| m.as_ref().trim()) {
            if !member.is_empty() {
                self = self.text("member", member);
            }
        }
        self.close(tag)
    }

    /// `<entry name="..."/>`
    pub(crate) fn named_entry(mut self, name: &str) -> Self {
        let _ = write!(self.xml, "<entry name=\"{}\"/>", escape(name));
        self
    }

    /// `<entry name="...">`, to be closed with `close("entry")`.
    pub(crate) fn open_entry(mut self, name: &str) -> Self {
        let _ = write!(self.xml, "<entry name=\"{}\">", escape(name));
        self
    }

    pub(crate) fn open(mut self, tag: &str) -> Self {
        let _ = write!(self.xml, "<{tag}>");
        self
    }

    pub(crate) fn close(mut self, tag: &str) -> Self {
        let _ = write!(self.xml, "</{tag}>");
        self
    }

    pub(crate) fn finish(self) -> String {
        self.xml
    }
}
