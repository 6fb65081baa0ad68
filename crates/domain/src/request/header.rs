//! HTTP Header types

use serde::{Deserialize, Serialize};

/// Name of the credential header.
pub const AUTHORIZATION: &str = "Authorization";

/// Name of the content type header.
pub const CONTENT_TYPE: &str = "Content-Type";

/// JSON media type.
pub const APPLICATION_JSON: &str = "application/json";

/// Form media type used by the password grant.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// A single HTTP header with name and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// The header name (e.g., "Content-Type")
    pub name: String,
    /// The header value (e.g., "application/json")
    pub value: String,
}

impl Header {
    /// Creates a new header.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered collection of HTTP headers with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    items: Vec<Header>,
}

impl Headers {
    /// Creates an empty header collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends a header, keeping any existing header of the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.items.push(Header::new(name, value));
    }

    /// Replaces every header of this name with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.remove(name);
        self.items.push(Header::new(name, value));
    }

    /// Sets the header only if it is not already present.
    pub fn set_if_absent(&mut self, name: &str, value: impl Into<String>) {
        if !self.contains(name) {
            self.items.push(Header::new(name, value));
        }
    }

    /// Removes every header of this name.
    pub fn remove(&mut self, name: &str) {
        self.items.retain(|h| !h.name.eq_ignore_ascii_case(name));
    }

    /// Returns the first value for a header name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Returns true when a header of this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.items.iter()
    }

    /// Returns the number of headers.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len is not const in stable
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
