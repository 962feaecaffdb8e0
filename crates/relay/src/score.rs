//! Quality scoring of probed relays.
//!
//! The weights are fixed so scores stay comparable between runs:
//!
//! | condition                    | effect                  |
//! |------------------------------|-------------------------|
//! | unreachable                  | 0.0, nothing else       |
//! | reachable                    | base 0.50               |
//! | information document present | +0.15                   |
//! | latency < 200 / 500 / 1000 / 2000 ms | +0.20 / 0.15 / 0.10 / 0.05 |
//! | auth required                | -0.10                   |
//! | payment required             | -0.10                   |
//! | configured as reliable       | +0.15                   |
//!
//! The result is clamped to `0.0..=1.0`.

use std::collections::BTreeSet;

use nihao_primitives::address::PeerAddress;
use nihao_primitives::capability::CapabilityRecord;

const BASE: f64 = 0.5;
const DOCUMENT_BONUS: f64 = 0.15;
const AUTH_PENALTY: f64 = 0.1;
const PAYMENT_PENALTY: f64 = 0.1;
const RELIABLE_BONUS: f64 = 0.15;

/// Latency ceilings (exclusive, milliseconds) and the bonus below each.
const LATENCY_TIERS: [(u64, f64); 4] = [(200, 0.20), (500, 0.15), (1000, 0.10), (2000, 0.05)];

/// Score and the reasons it is not perfect.
#[derive(Clone, Debug, PartialEq)]
pub struct Assessment {
    pub score: f64,
    pub issues: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Scorer {
    reliable: BTreeSet<PeerAddress>,
}

impl Scorer {
    /// A scorer rewarding the given relays. With an empty set only the
    /// measured properties count.
    #[must_use]
    pub fn new(reliable: impl IntoIterator<Item = PeerAddress>) -> Self {
        Self {
            reliable: reliable.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn assess(&self, record: &CapabilityRecord) -> Assessment {
        if !record.reachable {
            return Assessment {
                score: 0.0,
                issues: vec!["unreachable".to_owned()],
            };
        }

        let mut issues = Vec::new();
        let mut score = BASE;

        if record.has_document() {
            score += DOCUMENT_BONUS;
        } else {
            issues.push("no capability document".to_owned());
        }

        match LATENCY_TIERS
            .iter()
            .find(|(ceiling, _)| record.latency_ms < *ceiling)
        {
            Some((_, bonus)) => score += bonus,
            None => issues.push(format!("slow ({}ms)", record.latency_ms)),
        }

        if record.auth_required {
            score -= AUTH_PENALTY;
            issues.push("auth required".to_owned());
        }

        if record.payment_required {
            score -= PAYMENT_PENALTY;
            issues.push("payment required".to_owned());
        }

        if self.reliable.contains(&record.address) {
            score += RELIABLE_BONUS;
        }

        Assessment {
            score: score.clamp(0.0, 1.0),
            issues,
        }
    }

    /// Fill in `score` and `issues` of a freshly probed record.
    #[must_use]
    pub fn apply(&self, mut record: CapabilityRecord) -> CapabilityRecord {
        let Assessment { score, issues } = self.assess(&record);

        record.score = score;
        record.issues = issues;

        record
    }
}

#[cfg(test)]
mod tests {
    use nihao_primitives::capability::CapabilityDocument;
    use nihao_primitives::purpose::PurposeTag;
    use proptest::prelude::*;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn record(latency_ms: u64) -> CapabilityRecord {
        let mut record = CapabilityRecord::unprobed(
            "wss://relay.example".parse().unwrap(),
            PurposeTag::General,
        );
        record.reachable = true;
        record.latency_ms = latency_ms;
        record.document = Some(CapabilityDocument::default());
        record
    }

    #[test]
    fn test_unreachable_scores_zero() {
        let mut rec = record(10);
        rec.reachable = false;

        let assessment = Scorer::default().assess(&rec);

        assert!(assessment.score.abs() < EPSILON);
        assert_eq!(assessment.issues, vec!["unreachable".to_owned()]);
    }

    #[test]
    fn test_fast_documented_open_relay() {
        let assessment = Scorer::default().assess(&record(150));

        assert!((assessment.score - 0.85).abs() < EPSILON);
        assert!(assessment.issues.is_empty());
    }

    #[test]
    fn test_latency_tiers() {
        let cases = [
            (0, 0.85),
            (199, 0.85),
            (200, 0.80),
            (499, 0.80),
            (500, 0.75),
            (999, 0.75),
            (1000, 0.70),
            (1999, 0.70),
            (2000, 0.65),
            (9000, 0.65),
        ];

        for (latency, expected) in cases {
            let score = Scorer::default().assess(&record(latency)).score;
            assert!((score - expected).abs() < EPSILON, "latency {latency}: {score}");
        }
    }

    #[test]
    fn test_issues_for_constrained_relay() {
        let mut rec = record(2500);
        rec.document = None;
        rec.auth_required = true;
        rec.payment_required = true;

        let assessment = Scorer::default().assess(&rec);

        assert!((assessment.score - 0.3).abs() < EPSILON);
        assert_eq!(
            assessment.issues,
            vec![
                "no capability document".to_owned(),
                "slow (2500ms)".to_owned(),
                "auth required".to_owned(),
                "payment required".to_owned(),
            ]
        );
    }

    #[test]
    fn test_reliable_bonus_is_clamped() {
        let scorer = Scorer::new(["wss://relay.example".parse().unwrap()]);

        let assessment = scorer.assess(&record(50));

        assert!((assessment.score - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_apply_fills_record() {
        let rec = Scorer::default().apply(record(3000));

        assert!((rec.score - 0.65).abs() < EPSILON);
        assert_eq!(rec.issues, vec!["slow (3000ms)".to_owned()]);
    }

    fn arb_record() -> impl Strategy<Value = CapabilityRecord> {
        (
            any::<bool>(),
            any::<u64>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(reachable, latency_ms, document, auth, payment)| {
                let mut rec = record(latency_ms);
                rec.reachable = reachable;
                rec.document = document.then(CapabilityDocument::default);
                rec.auth_required = auth;
                rec.payment_required = payment;
                rec
            })
    }

    proptest! {
        #[test]
        fn score_stays_in_unit_interval(rec in arb_record(), reliable in any::<bool>()) {
            let scorer = if reliable {
                Scorer::new([rec.address.clone()])
            } else {
                Scorer::default()
            };

            let score = scorer.assess(&rec).score;
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn unreachable_is_always_zero(mut rec in arb_record()) {
            rec.reachable = false;

            prop_assert_eq!(Scorer::default().assess(&rec).score, 0.0);
        }

        #[test]
        fn lower_latency_never_scores_lower(
            rec in arb_record(),
            a in any::<u64>(),
            b in any::<u64>(),
        ) {
            let (fast, slow) = if a <= b { (a, b) } else { (b, a) };
            let scorer = Scorer::default();

            let mut fast_rec = rec.clone();
            fast_rec.latency_ms = fast;
            let mut slow_rec = rec;
            slow_rec.latency_ms = slow;

            prop_assert!(scorer.assess(&fast_rec).score >= scorer.assess(&slow_rec).score);
        }
    }
}
