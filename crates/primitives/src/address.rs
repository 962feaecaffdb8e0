#[cfg(test)]
#[path = "tests/address.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport prefixes a relay address may carry, paired with the scheme used
/// to fetch its information document over plain HTTP(S).
const TRANSPORTS: [(&str, &str); 2] = [("wss://", "https://"), ("ws://", "http://")];

/// Address of a relay, e.g. `wss://relay.damus.io`.
///
/// Construction goes through [`PeerAddress::normalize`], so every value is
/// trimmed, carries no trailing slash and starts with a recognized transport
/// prefix. The address is used verbatim as a map key afterwards.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PeerAddress(String);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("'{0}' does not start with ws:// or wss://")]
    UnsupportedTransport(String),
}

impl PeerAddress {
    /// Trims surrounding whitespace and trailing slashes, then requires a
    /// recognized transport prefix. Returns `None` for anything else.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_end_matches('/');

        TRANSPORTS
            .iter()
            .any(|(prefix, _)| trimmed.starts_with(prefix))
            .then(|| Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of the relay information document: the transport scheme swapped
    /// for its HTTP equivalent, everything else untouched.
    #[must_use]
    pub fn document_url(&self) -> String {
        for (transport, http) in TRANSPORTS {
            if let Some(rest) = self.0.strip_prefix(transport) {
                return format!("{http}{rest}");
            }
        }

        // unreachable by construction, keep the address as-is
        self.0.clone()
    }
}

impl FromStr for PeerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| AddressError::UnsupportedTransport(s.to_owned()))
    }
}

impl AsRef<str> for PeerAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl<'de> Deserialize<'de> for PeerAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        raw.parse().map_err(serde::de::Error::custom)
    }
}
