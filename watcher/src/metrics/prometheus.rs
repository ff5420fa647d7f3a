//! Prometheus-backed metric sink.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry (prefixed with the configured namespace) and the strongly-typed
//! [`WatcherMetrics`] gauge set, and encodes it for scrapes.

use prometheus::{self, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use tracing::error;

use crate::derive::{Observations, StakeObservation, ValidatorLabels};

const VALIDATOR_LABELS: &[&str] = &["account_id", "public_key", "epoch_start_height", "tracked"];
const KICKOUT_LABELS: &[&str] = &["account_id", "reason", "epoch_start_height", "tracked"];

/// Gauges exported by the watcher.
///
/// Scalar gauges are overwritten every cycle. Labeled groups are reset and
/// repopulated, so validators that left the set do not linger.
#[derive(Clone)]
pub struct WatcherMetrics {
    pub block_number: Gauge,
    pub chain_id: GaugeVec,
    pub epoch_length: Gauge,
    pub epoch_start_height: Gauge,
    pub protocol_version: Gauge,
    pub seat_price: Gauge,
    pub sync_state: Gauge,
    pub version_build: GaugeVec,

    pub validator_stake: GaugeVec,
    pub validator_rank: GaugeVec,
    pub validator_blocks_expected: GaugeVec,
    pub validator_blocks_produced: GaugeVec,
    pub validator_chunks_expected: GaugeVec,
    pub validator_chunks_produced: GaugeVec,
    pub validator_endorsements_expected: GaugeVec,
    pub validator_endorsements_produced: GaugeVec,
    pub validator_slashed: GaugeVec,

    pub next_validator_stake: GaugeVec,
    pub current_proposals_stake: GaugeVec,
    pub prev_epoch_kickout: GaugeVec,
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge, prometheus::Error> {
    let g = Gauge::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<GaugeVec, prometheus::Error> {
    let g = GaugeVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

impl WatcherMetrics {
    /// Registers the watcher gauges into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            block_number: gauge(registry, "block_number", "The number of most recent block")?,
            chain_id: gauge_vec(registry, "chain_id", "NEAR chain ID", &["chain_id"])?,
            epoch_length: gauge(
                registry,
                "epoch_length",
                "NEAR epoch length as specified in the protocol",
            )?,
            epoch_start_height: gauge(registry, "epoch_start_height", "NEAR epoch start height")?,
            protocol_version: gauge(
                registry,
                "protocol_version",
                "Current protocol version deployed to the blockchain",
            )?,
            seat_price: gauge(registry, "seat_price", "Validator seat price")?,
            sync_state: gauge(
                registry,
                "sync_state",
                "Sync state of the node (0 = synced, 1 = syncing)",
            )?,
            version_build: gauge_vec(
                registry,
                "version_build",
                "NEAR node version and build",
                &["version", "build"],
            )?,

            validator_stake: gauge_vec(
                registry,
                "validator_stake",
                "Current amount of validator stake",
                VALIDATOR_LABELS,
            )?,
            validator_rank: gauge_vec(
                registry,
                "validator_rank",
                "Stake ranking of this validator",
                VALIDATOR_LABELS,
            )?,
            validator_blocks_expected: gauge_vec(
                registry,
                "validator_blocks_expected",
                "Current amount of validator expected blocks",
                VALIDATOR_LABELS,
            )?,
            validator_blocks_produced: gauge_vec(
                registry,
                "validator_blocks_produced",
                "Current amount of validator produced blocks",
                VALIDATOR_LABELS,
            )?,
            validator_chunks_expected: gauge_vec(
                registry,
                "validator_chunks_expected",
                "Current amount of validator expected chunks",
                VALIDATOR_LABELS,
            )?,
            validator_chunks_produced: gauge_vec(
                registry,
                "validator_chunks_produced",
                "Current amount of validator produced chunks",
                VALIDATOR_LABELS,
            )?,
            validator_endorsements_expected: gauge_vec(
                registry,
                "validator_endorsements_expected",
                "Current amount of validator expected chunk endorsements",
                VALIDATOR_LABELS,
            )?,
            validator_endorsements_produced: gauge_vec(
                registry,
                "validator_endorsements_produced",
                "Current amount of validator produced chunk endorsements",
                VALIDATOR_LABELS,
            )?,
            validator_slashed: gauge_vec(
                registry,
                "validator_slashed",
                "Validator slashed state (1 = slashed)",
                VALIDATOR_LABELS,
            )?,

            next_validator_stake: gauge_vec(
                registry,
                "next_validator_stake",
                "The next validators stake",
                VALIDATOR_LABELS,
            )?,
            current_proposals_stake: gauge_vec(
                registry,
                "current_proposals_stake",
                "Current proposals stake",
                VALIDATOR_LABELS,
            )?,
            prev_epoch_kickout: gauge_vec(
                registry,
                "prev_epoch_kickout",
                "Validators kicked out in the previous epoch",
                KICKOUT_LABELS,
            )?,
        })
    }

    fn labeled(&self) -> [&GaugeVec; 14] {
        [
            &self.chain_id,
            &self.version_build,
            &self.validator_stake,
            &self.validator_rank,
            &self.validator_blocks_expected,
            &self.validator_blocks_produced,
            &self.validator_chunks_expected,
            &self.validator_chunks_produced,
            &self.validator_endorsements_expected,
            &self.validator_endorsements_produced,
            &self.validator_slashed,
            &self.next_validator_stake,
            &self.current_proposals_stake,
            &self.prev_epoch_kickout,
        ]
    }

    /// Publishes the observations of one cycle in a single pass.
    pub fn publish(&self, obs: &Observations) {
        for vec in self.labeled() {
            vec.reset();
        }

        self.block_number.set(obs.block_number as f64);
        self.epoch_length.set(obs.epoch_length as f64);
        self.epoch_start_height.set(obs.epoch_start_height as f64);
        self.protocol_version.set(f64::from(obs.protocol_version));
        self.seat_price.set(obs.seat_price.to_f64());
        self.sync_state.set(if obs.syncing { 1.0 } else { 0.0 });

        self.chain_id
            .with_label_values(&[obs.chain_id.as_str()])
            .set(obs.chain_id_value());
        self.version_build
            .with_label_values(&[obs.version.as_str(), obs.build.as_str()])
            .set(obs.version_build_value());

        let epoch = obs.epoch_label();

        for v in &obs.validators {
            let values = label_values(&v.labels, &epoch);
            self.validator_stake
                .with_label_values(&values)
                .set(v.stake.to_f64());
            self.validator_rank
                .with_label_values(&values)
                .set(v.rank as f64);
            self.validator_blocks_expected
                .with_label_values(&values)
                .set(v.blocks_expected as f64);
            self.validator_blocks_produced
                .with_label_values(&values)
                .set(v.blocks_produced as f64);
            self.validator_chunks_expected
                .with_label_values(&values)
                .set(v.chunks_expected as f64);
            self.validator_chunks_produced
                .with_label_values(&values)
                .set(v.chunks_produced as f64);
            self.validator_endorsements_expected
                .with_label_values(&values)
                .set(v.endorsements_expected as f64);
            self.validator_endorsements_produced
                .with_label_values(&values)
                .set(v.endorsements_produced as f64);
            self.validator_slashed
                .with_label_values(&values)
                .set(if v.slashed { 1.0 } else { 0.0 });
        }

        publish_stakes(&self.next_validator_stake, &obs.next_validators, &epoch);
        publish_stakes(&self.current_proposals_stake, &obs.proposals, &epoch);

        for k in &obs.kickouts {
            self.prev_epoch_kickout
                .with_label_values(&[
                    k.account_id.as_str(),
                    k.reason.as_str(),
                    epoch.as_str(),
                    k.tracked,
                ])
                .set(1.0);
        }
    }
}

fn label_values<'a>(labels: &'a ValidatorLabels, epoch: &'a str) -> [&'a str; 4] {
    [
        labels.account_id.as_str(),
        labels.public_key.as_str(),
        epoch,
        labels.tracked,
    ]
}

fn publish_stakes(vec: &GaugeVec, stakes: &[StakeObservation], epoch: &str) {
    for s in stakes {
        vec.with_label_values(&label_values(&s.labels, epoch))
            .set(s.stake.to_f64());
    }
}

/// Wrapper around a Prometheus registry and the watcher metrics.
///
/// This is the handle shared between the refresh loop and the scrape
/// endpoint; wrap it in an [`std::sync::Arc`].
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub watcher: WatcherMetrics,
}

impl MetricsRegistry {
    /// Creates a registry whose metric names are prefixed with
    /// `<namespace>_` and registers the watcher gauges.
    pub fn new(namespace: &str) -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some(namespace.to_string()), None)?;
        let watcher = WatcherMetrics::register(&registry)?;
        Ok(Self { registry, watcher })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            error!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
