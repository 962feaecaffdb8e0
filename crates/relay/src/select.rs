//! Working-set selection from ranked candidates.

use nihao_primitives::address::PeerAddress;
use nihao_primitives::capability::CapabilityRecord;
use nihao_primitives::purpose::PurposeTag;
use tracing::debug;

use crate::config::RelayConfig;

/// Lowest score a general relay may have to be selected.
pub const MIN_GENERAL_SCORE: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct Selector {
    fallback_outbox: PeerAddress,
    default_max: usize,
}

impl Selector {
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            fallback_outbox: config.fallback_outbox.clone(),
            default_max: config.max_relays,
        }
    }

    /// Walk `candidates` (best first) and pick the working set.
    ///
    /// At most one outbox relay is taken, regardless of its score. General
    /// relays need [`MIN_GENERAL_SCORE`]. Selection stops once `max_count`
    /// relays are in. When no outbox relay made it, the fallback outbox is
    /// appended even if that exceeds `max_count`. A `max_count` of zero means
    /// the configured default.
    #[must_use]
    pub fn select(&self, candidates: &[CapabilityRecord], max_count: usize) -> Vec<PeerAddress> {
        let max_count = if max_count == 0 {
            self.default_max
        } else {
            max_count
        };

        let mut selected = Vec::with_capacity(max_count + 1);
        let mut has_outbox = false;

        for candidate in candidates {
            if selected.len() >= max_count {
                break;
            }

            if !candidate.reachable
                || candidate.payment_required
                || candidate.purpose.is_excluded_from_selection()
            {
                continue;
            }

            if candidate.purpose == PurposeTag::Outbox {
                if !has_outbox {
                    selected.push(candidate.address.clone());
                    has_outbox = true;
                }
                continue;
            }

            if candidate.score >= MIN_GENERAL_SCORE {
                selected.push(candidate.address.clone());
            }
        }

        if !has_outbox && !selected.contains(&self.fallback_outbox) {
            debug!(fallback = %self.fallback_outbox, "No outbox relay selected");
            selected.push(self.fallback_outbox.clone());
        }

        selected
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(&RelayConfig::default())
    }
}

#[cfg(test)]
#[path = "tests/select.rs"]
mod tests;
