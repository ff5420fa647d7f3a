//! Snapshot collection.
//!
//! One cycle issues exactly three concurrent gateway reads and buffers their
//! results into a [`Snapshot`]. Nothing is published here: the snapshot is
//! either complete or the whole cycle fails.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::retry::RetryableError;
use crate::rpc::{BlockSelector, ChainGateway, EpochSelector, Method, RpcError};
use crate::types::Snapshot;

/// Errors raised while collecting a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// One of the gateway calls failed; the others were dropped.
    #[error("{endpoint} call failed: {source}")]
    Rpc {
        endpoint: Method,
        #[source]
        source: RpcError,
    },
    /// The cancellation token fired while calls were in flight.
    #[error("collection cancelled")]
    Cancelled,
}

impl CollectError {
    /// Endpoint of the failing call, if any.
    pub fn endpoint(&self) -> Option<Method> {
        match self {
            CollectError::Rpc { endpoint, .. } => Some(*endpoint),
            CollectError::Cancelled => None,
        }
    }
}

impl RetryableError for CollectError {
    fn is_retryable(&self) -> bool {
        match self {
            CollectError::Rpc { source, .. } => source.is_retryable(),
            CollectError::Cancelled => false,
        }
    }
}

/// Fetches the three chain views the watcher derives its metrics from.
#[derive(Clone, Debug)]
pub struct Collector<G> {
    gateway: G,
    epoch: EpochSelector,
    block: BlockSelector,
}

impl<G: ChainGateway> Collector<G> {
    /// Collector reading the latest epoch at `final` finality.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            epoch: EpochSelector::default(),
            block: BlockSelector::default(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Runs one collection.
    ///
    /// The first failing call drops the two others, aborting their in-flight
    /// requests. Cancellation does the same for all three.
    pub async fn collect(&self, cancel: &CancellationToken) -> Result<Snapshot, CollectError> {
        let status = async {
            debug!(endpoint = %Method::Status, "fetching");
            self.gateway.status().await.map_err(|source| CollectError::Rpc {
                endpoint: Method::Status,
                source,
            })
        };
        let validators = async {
            debug!(endpoint = %Method::Validators, "fetching");
            self.gateway
                .validators(&self.epoch)
                .await
                .map_err(|source| CollectError::Rpc {
                    endpoint: Method::Validators,
                    source,
                })
        };
        let protocol_config = async {
            debug!(endpoint = %Method::ProtocolConfig, "fetching");
            self.gateway
                .protocol_config(&self.block)
                .await
                .map_err(|source| CollectError::Rpc {
                    endpoint: Method::ProtocolConfig,
                    source,
                })
        };

        let (status, validators, protocol_config) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CollectError::Cancelled),
            res = async { tokio::try_join!(status, validators, protocol_config) } => res?,
        };

        Ok(Snapshot {
            status,
            protocol_config,
            validators,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::types::{NodeStatus, ProtocolConfig, ValidatorSet};

    pub(crate) const STATUS: &str = include_str!("../tests/fixtures/status.json");
    pub(crate) const VALIDATORS: &str = include_str!("../tests/fixtures/validators.json");
    pub(crate) const PROTOCOL_CONFIG: &str = include_str!("../tests/fixtures/protocol_config.json");

    /// In-memory gateway serving the fixtures, with optional failure injection.
    #[derive(Default)]
    pub(crate) struct FakeGateway {
        pub(crate) fail_validators: Mutex<Option<fn() -> RpcError>>,
        pub(crate) hang_status: bool,
        pub(crate) calls: AtomicU32,
        pub(crate) validator_calls: AtomicU32,
    }

    impl FakeGateway {
        pub(crate) fn failing_validators(make: fn() -> RpcError) -> Self {
            Self {
                fail_validators: Mutex::new(Some(make)),
                ..Self::default()
            }
        }

        pub(crate) fn set_validators_failure(&self, make: Option<fn() -> RpcError>) {
            *self.fail_validators.lock().unwrap() = make;
        }
    }

    pub(crate) fn server_error() -> RpcError {
        RpcError::Protocol {
            name: "HANDLER_ERROR".to_string(),
            code: -32000,
            message: "Server error".to_string(),
            data: None,
            cause: Some("UNKNOWN_EPOCH".to_string()),
        }
    }

    #[async_trait]
    impl ChainGateway for FakeGateway {
        async fn status(&self) -> Result<NodeStatus, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang_status {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(serde_json::from_str(STATUS).unwrap())
        }

        async fn validators(&self, _epoch: &EpochSelector) -> Result<ValidatorSet, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.validator_calls.fetch_add(1, Ordering::SeqCst);
            let fail = *self.fail_validators.lock().unwrap();
            match fail {
                Some(make) => Err(make()),
                None => Ok(serde_json::from_str(VALIDATORS).unwrap()),
            }
        }

        async fn protocol_config(
            &self,
            _block: &BlockSelector,
        ) -> Result<ProtocolConfig, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_str(PROTOCOL_CONFIG).unwrap())
        }
    }

    #[tokio::test]
    async fn collects_all_three_views() {
        let collector = Collector::new(FakeGateway::default());
        let snapshot = collector
            .collect(&CancellationToken::new())
            .await
            .expect("collection should succeed");

        assert_eq!(snapshot.status.chain_id, "testnet");
        assert_eq!(snapshot.protocol_config.epoch_length, 43200);
        assert_eq!(snapshot.validators.current_validators.len(), 5);
        assert_eq!(collector.gateway().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failure_names_the_endpoint() {
        let collector = Collector::new(FakeGateway::failing_validators(server_error));
        let err = collector
            .collect(&CancellationToken::new())
            .await
            .expect_err("validators failure must fail the cycle");

        assert_eq!(err.endpoint(), Some(Method::Validators));
        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("validators call failed"));
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_calls() {
        let collector = Collector::new(FakeGateway {
            hang_status: true,
            ..FakeGateway::default()
        });
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = collector.collect(&cancel).await.expect_err("cancelled");
        assert!(matches!(err, CollectError::Cancelled));
        assert!(!err.is_retryable());
    }
}
