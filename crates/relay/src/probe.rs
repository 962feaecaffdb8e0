//! Capability probing.
//!
//! Two independent sub-probes run side by side: the information document
//! fetch over HTTP and a bare WebSocket handshake. Only the handshake decides
//! reachability.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::capability::{CapabilityDocument, CapabilityRecord};
use nihao_primitives::purpose::PurposeTag;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::classify::Classifier;
use crate::config::RelayConfig;
use crate::score::Scorer;
use crate::session::{DocumentSource, RelaySession, SessionError};

const NOSTR_JSON: &str = "application/nostr+json";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("document larger than {0} bytes")]
    TooLarge(usize),

    #[error("invalid document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything able to turn an address into a scored capability record.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, address: &PeerAddress) -> CapabilityRecord;
}

/// Result of the document sub-probe.
#[derive(Debug)]
pub struct DocumentProbe {
    pub document: Option<CapabilityDocument>,
    pub latency: Duration,
}

/// Result of the session sub-probe.
#[derive(Clone, Copy, Debug)]
pub struct SessionProbe {
    pub connected: bool,
    pub latency: Duration,
}

#[derive(Clone, Debug)]
pub struct Prober {
    http: Client,
    classifier: Arc<Classifier>,
    scorer: Arc<Scorer>,
    timeout: Duration,
    body_limit: usize,
}

impl Prober {
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(Classifier::new(config)),
            Arc::new(Scorer::new(config.reliable.iter().cloned())),
        )
    }

    #[must_use]
    pub fn with_parts(
        config: &RelayConfig,
        classifier: Arc<Classifier>,
        scorer: Arc<Scorer>,
    ) -> Self {
        Self {
            http: Client::new(),
            classifier,
            scorer,
            timeout: config.timeouts.probe(),
            body_limit: config.timeouts.document_body_limit,
        }
    }

    /// Fetch the relay information document. Latency covers the request up
    /// to the response headers.
    pub async fn fetch_document(
        &self,
        address: &PeerAddress,
    ) -> (Result<CapabilityDocument, FetchError>, Duration) {
        let start = Instant::now();

        let response = self
            .http
            .get(address.document_url())
            .header(ACCEPT, NOSTR_JSON)
            .timeout(self.timeout)
            .send()
            .await;

        let latency = start.elapsed();

        let document = match response {
            Ok(response) => self.read_document(response).await,
            Err(err) => Err(err.into()),
        };

        (document, latency)
    }

    async fn read_document(
        &self,
        mut response: reqwest::Response,
    ) -> Result<CapabilityDocument, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.body_limit {
                return Err(FetchError::TooLarge(self.body_limit));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Open and immediately release a native session.
    pub async fn test_session(
        &self,
        address: &PeerAddress,
    ) -> (Result<(), SessionError>, Duration) {
        let start = Instant::now();

        let outcome = RelaySession::connect(address, self.timeout).await;
        let latency = start.elapsed();

        match outcome {
            Ok(mut session) => {
                session.close().await;
                (Ok(()), latency)
            }
            Err(err) => (Err(err), latency),
        }
    }

    /// Run both sub-probes and score the merged record.
    pub async fn inspect(&self, address: &PeerAddress) -> CapabilityRecord {
        let ((document, document_latency), (session, session_latency)) =
            tokio::join!(self.fetch_document(address), self.test_session(address));

        let document = match document {
            Ok(document) => Some(document),
            Err(err) => {
                debug!(%address, error = %err, "No relay information document");
                None
            }
        };

        if let Err(err) = &session {
            debug!(%address, error = %err, "Session probe failed");
        }

        let record = merge(
            address.clone(),
            self.classifier.classify(address),
            DocumentProbe {
                document,
                latency: document_latency,
            },
            SessionProbe {
                connected: session.is_ok(),
                latency: session_latency,
            },
        );

        let record = self.scorer.apply(record);

        debug!(
            %address,
            reachable = record.reachable,
            latency_ms = record.latency_ms,
            score = record.score,
            purpose = %record.purpose,
            "Probed relay"
        );

        record
    }

    /// Probe and score many relays concurrently; output follows input order.
    pub async fn score_all(&self, addresses: &[PeerAddress]) -> Vec<CapabilityRecord> {
        join_all(addresses.iter().map(|address| self.inspect(address))).await
    }
}

#[async_trait]
impl Probe for Prober {
    async fn probe(&self, address: &PeerAddress) -> CapabilityRecord {
        self.inspect(address).await
    }
}

/// Combine both sub-probes into an unscored record.
///
/// Reachability comes from the session alone; an unreachable relay keeps
/// nothing from the document. Latency prefers the document round trip and
/// falls back to the handshake time. Auth and payment flags come from the
/// document's limitation section.
#[must_use]
pub fn merge(
    address: PeerAddress,
    purpose: PurposeTag,
    fetched: DocumentProbe,
    session: SessionProbe,
) -> CapabilityRecord {
    let mut record = CapabilityRecord::unprobed(address, purpose);

    if !session.connected {
        return record;
    }

    record.reachable = true;
    record.latency_ms = millis(session.latency);

    if let Some(document) = fetched.document {
        record.latency_ms = millis(fetched.latency);

        if let Some(limitation) = &document.limitation {
            record.auth_required = limitation.auth_required;
            record.payment_required = limitation.payment_required;
        }

        record.document = Some(document);
    }

    record
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
