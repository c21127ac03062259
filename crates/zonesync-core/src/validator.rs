//! Staleness validation for cached zone snapshots
//!
//! A cached snapshot is trusted only if the zone's authoritative server still
//! reports the serial the snapshot was read at. The check goes through
//! [`SerialQuery`], a DNS side channel independent of the record store.
//! Nothing here ever fails the caller: an unanswerable query simply means the
//! snapshot cannot be trusted.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::model::SoaSnapshot;
use crate::traits::SerialQuery;

/// Outcome of checking one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Served serial equals the cached one
    Fresh,
    /// Served serial differs from the cached one
    Stale {
        cached: u32,
        served: u32,
    },
    /// The query failed, timed out, or was cancelled
    Unverified(String),
}

impl Validation {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Validation::Fresh)
    }
}

/// Checks cached snapshots against their authoritative server
#[derive(Clone)]
pub struct StalenessValidator {
    query: Arc<dyn SerialQuery>,
}

impl StalenessValidator {
    pub fn new(query: Arc<dyn SerialQuery>) -> Self {
        Self { query }
    }

    /// Compare the snapshot serial with the serial served right now
    pub async fn validate(
        &self,
        zone: &str,
        snapshot: &SoaSnapshot,
        cancel: &CancellationToken,
    ) -> Validation {
        debug!("Checking SOA of {} against cached serial {}", zone, snapshot.serial);

        let query = self.query.query_serial(zone, &snapshot.server);
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Validation::Unverified("cancelled".to_string()),
            outcome = query => outcome,
        };

        match outcome {
            Ok(served) if served == snapshot.serial => {
                debug!("SOA of {} from cache is valid", zone);
                Validation::Fresh
            }
            Ok(served) => {
                debug!(
                    "SOA of {} moved from {} to {}, cache is stale",
                    zone, snapshot.serial, served
                );
                Validation::Stale {
                    cached: snapshot.serial,
                    served,
                }
            }
            Err(e) => {
                warn!("SOA check for {} failed, cache unverified: {}", zone, e);
                Validation::Unverified(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ZoneSoa;
    use async_trait::async_trait;

    struct FixedSerial(Result<u32, String>);

    #[async_trait]
    impl SerialQuery for FixedSerial {
        async fn query_serial(&self, _zone: &str, server: &str) -> crate::Result<u32> {
            assert_eq!(server, "ns1.example.net.");
            self.0.clone().map_err(crate::Error::authoritative)
        }
    }

    fn snapshot(serial: u32) -> SoaSnapshot {
        SoaSnapshot::new(
            ZoneSoa {
                server: "ns1.example.net.".into(),
                serial,
            },
            Vec::new(),
        )
    }

    async fn check(answer: Result<u32, String>, cached: u32) -> Validation {
        StalenessValidator::new(Arc::new(FixedSerial(answer)))
            .validate("example.com", &snapshot(cached), &CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn test_matching_serial_is_fresh() {
        assert_eq!(check(Ok(42), 42).await, Validation::Fresh);
    }

    #[tokio::test]
    async fn test_moved_serial_is_stale() {
        assert_eq!(
            check(Ok(43), 42).await,
            Validation::Stale {
                cached: 42,
                served: 43
            }
        );
    }

    #[tokio::test]
    async fn test_query_error_is_unverified() {
        let outcome = check(Err("timeout".into()), 42).await;
        assert!(matches!(outcome, Validation::Unverified(ref m) if m.contains("timeout")));
        assert!(!outcome.is_fresh());
    }

    #[tokio::test]
    async fn test_cancelled_is_unverified() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = StalenessValidator::new(Arc::new(FixedSerial(Ok(42))))
            .validate("example.com", &snapshot(42), &cancel)
            .await;
        assert_eq!(outcome, Validation::Unverified("cancelled".into()));
    }
}
