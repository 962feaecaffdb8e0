use std::collections::{BTreeMap, BTreeSet};

use nihao_primitives::event::Kind;
use nihao_primitives::purpose::PurposeTag;

use crate::config::{PatternRule, RelayConfig};

/// Maps relay addresses to their purpose using literal tables only.
#[derive(Clone, Debug)]
pub struct Classifier {
    exact: BTreeMap<String, PurposeTag>,
    patterns: Vec<PatternRule>,
    outbox_kinds: BTreeSet<Kind>,
}

impl Classifier {
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            exact: config.classification.exact.clone(),
            patterns: config.classification.patterns.clone(),
            outbox_kinds: config.outbox_kinds.iter().copied().collect(),
        }
    }

    /// Exact table first, then the substring rules in order, else general.
    #[must_use]
    pub fn classify(&self, address: impl AsRef<str>) -> PurposeTag {
        let address = address.as_ref();

        if let Some(purpose) = self.exact.get(address) {
            return *purpose;
        }

        self.patterns
            .iter()
            .find(|rule| address.contains(rule.pattern.as_str()))
            .map_or(PurposeTag::General, |rule| rule.purpose)
    }

    /// Whether an event of `kind` belongs on the relay at `address`.
    #[must_use]
    pub fn should_publish_to(&self, address: impl AsRef<str>, kind: Kind) -> bool {
        match self.classify(address) {
            PurposeTag::General => true,
            PurposeTag::Outbox => self.outbox_kinds.contains(&kind),
            PurposeTag::Inbox | PurposeTag::Search | PurposeTag::Nwc | PurposeTag::Paid => false,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&RelayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_classify_known_relays() {
        let classifier = Classifier::default();

        let cases = [
            ("wss://purplepag.es", PurposeTag::Outbox),
            ("wss://relay.nos.social", PurposeTag::Inbox),
            ("wss://relay.damus.io", PurposeTag::General),
            ("wss://relay.primal.net", PurposeTag::General),
            ("wss://nos.lol", PurposeTag::General),
            ("wss://premium.primal.net", PurposeTag::Paid),
            ("wss://nostr.wine", PurposeTag::Paid),
            ("wss://search.nos.today", PurposeTag::Search),
            ("wss://pyramid.fiatjaf.com/inbox", PurposeTag::Inbox),
            ("wss://pyramid.fiatjaf.com", PurposeTag::Paid),
            ("wss://nwc.example.com", PurposeTag::Nwc),
        ];

        for (address, expected) in cases {
            assert_eq!(classifier.classify(address), expected, "classify({address})");
        }
    }

    #[test]
    fn test_classify_uses_injected_tables() {
        let mut config = RelayConfig::default();
        let _ignored = config
            .classification
            .exact
            .insert("specialized-outbox-peer".to_owned(), PurposeTag::Outbox);
        config.classification.patterns = vec![PatternRule {
            pattern: "archive".to_owned(),
            purpose: PurposeTag::Search,
        }];

        let classifier = Classifier::new(&config);

        assert_eq!(classifier.classify("specialized-outbox-peer"), PurposeTag::Outbox);
        assert_eq!(classifier.classify("wss://archive.example"), PurposeTag::Search);
        assert_eq!(classifier.classify("wss://nwc.example.com"), PurposeTag::General);
    }

    #[test]
    fn test_outbox_publish_eligibility() {
        let mut config = RelayConfig::default();
        let _ignored = config
            .classification
            .exact
            .insert("specialized-outbox-peer".to_owned(), PurposeTag::Outbox);
        let classifier = Classifier::new(&config);

        for kind in [Kind::PROFILE, Kind::FOLLOW_LIST, Kind::RELAY_LIST] {
            assert!(classifier.should_publish_to("specialized-outbox-peer", kind));
        }
        assert!(!classifier.should_publish_to("specialized-outbox-peer", Kind::TEXT_NOTE));
    }

    #[test]
    fn test_should_publish_to() {
        let classifier = Classifier::default();

        let cases = [
            ("wss://relay.damus.io", Kind(0), true),
            ("wss://relay.damus.io", Kind(1), true),
            ("wss://relay.damus.io", Kind(10_002), true),
            ("wss://purplepag.es", Kind(0), true),
            ("wss://purplepag.es", Kind(3), true),
            ("wss://purplepag.es", Kind(10_002), true),
            ("wss://purplepag.es", Kind(1), false),
            ("wss://purplepag.es", Kind(17_375), false),
            ("wss://relay.nos.social", Kind(0), false),
            ("wss://search.nos.today", Kind(1), false),
            ("wss://premium.primal.net", Kind(0), false),
        ];

        for (address, kind, expected) in cases {
            assert_eq!(
                classifier.should_publish_to(address, kind),
                expected,
                "should_publish_to({address}, {kind})"
            );
        }
    }

    proptest! {
        #[test]
        fn classify_is_total_and_deterministic(address in ".*") {
            let classifier = Classifier::default();
            let first = classifier.classify(&address);

            prop_assert!(PurposeTag::ALL.contains(&first));
            prop_assert_eq!(first, classifier.classify(&address));
        }
    }
}
