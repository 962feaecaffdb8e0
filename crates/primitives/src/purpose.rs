use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Intended role of a relay, deciding which events belong there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurposeTag {
    /// Accepts any kind of event.
    #[default]
    General,
    /// Relay-list aggregator: profile, follow list and relay list only.
    Outbox,
    /// Mention-only inbox, useless for setup publishing.
    Inbox,
    /// Full-text search relay.
    Search,
    /// Wallet-connect endpoint, not a relay for events.
    Nwc,
    /// Requires membership or payment before accepting writes.
    Paid,
}

impl PurposeTag {
    pub const ALL: [Self; 6] = [
        Self::General,
        Self::Outbox,
        Self::Inbox,
        Self::Search,
        Self::Nwc,
        Self::Paid,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Outbox => "outbox",
            Self::Inbox => "inbox",
            Self::Search => "search",
            Self::Nwc => "nwc",
            Self::Paid => "paid",
        }
    }

    /// Purposes that never receive events from a default setup.
    #[must_use]
    pub const fn is_excluded_from_selection(self) -> bool {
        matches!(self, Self::Inbox | Self::Search | Self::Nwc | Self::Paid)
    }
}

impl fmt::Display for PurposeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown relay purpose '{0}'")]
pub struct UnknownPurpose(pub String);

impl FromStr for PurposeTag {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownPurpose(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_str() {
        for tag in PurposeTag::ALL {
            assert_eq!(tag.as_str().parse::<PurposeTag>(), Ok(tag));
        }
        assert!("specialized".parse::<PurposeTag>().is_err());
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&PurposeTag::Nwc).unwrap();
        assert_eq!(json, r#""nwc""#);
    }
}
