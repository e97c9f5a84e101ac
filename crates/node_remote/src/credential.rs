//! Bearer credential taken from the inbound request and forwarded unchanged
//! to every outbound per-node call.

use std::fmt;

use reqwest::header::{HeaderMap, AUTHORIZATION};

/// The raw `Authorization` value, or nothing. Absence is a valid state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn bearer(token: &str) -> Self {
        Self(Some(format!("Bearer {token}")))
    }

    /// Use a header value verbatim.
    pub fn from_header_value(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    /// First `Authorization` header value, if any. Non-UTF-8 values count as absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get_all(AUTHORIZATION)
            .iter()
            .next()
            .and_then(|value| value.to_str().ok())
            .map(Self::from_header_value)
            .unwrap_or_default()
    }

    pub fn as_header_value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credential(<redacted>)"),
            None => f.write_str("Credential(None)"),
        }
    }
}
