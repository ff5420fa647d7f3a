//! Metric derivation.
//!
//! Turns one [`Snapshot`] into the [`Observations`] published for that
//! cycle. Everything here is pure: no I/O, no metric writes, no clock. The
//! computed facts are:
//!
//! - stake rank of every current validator (1 = largest stake),
//! - seat price (smallest current stake),
//! - tracked flag per account,
//! - block/chunk uptime and the resulting health of tracked validators,
//! - compact JSON kickout reasons.

use crate::config::TrackedAccounts;
use crate::types::{CurrentValidator, Snapshot, Stake};

/// Minimum block and chunk uptime, in percent, of a healthy validator.
pub const HEALTHY_UPTIME: f64 = 90.0;

/// Labels shared by every validator-scoped series.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidatorLabels {
    pub account_id: String,
    pub public_key: String,
    /// `"1"` or `"0"`.
    pub tracked: &'static str,
}

/// Per-cycle facts about one current validator.
#[derive(Clone, Debug)]
pub struct ValidatorObservation {
    pub labels: ValidatorLabels,
    pub stake: Stake,
    /// 1-based position in the stake ranking.
    pub rank: usize,
    pub blocks_expected: u64,
    pub blocks_produced: u64,
    pub chunks_expected: u64,
    pub chunks_produced: u64,
    pub endorsements_expected: u64,
    pub endorsements_produced: u64,
    pub slashed: bool,
}

/// Stake of a next-epoch validator or of a proposal.
#[derive(Clone, Debug)]
pub struct StakeObservation {
    pub labels: ValidatorLabels,
    pub stake: Stake,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KickoutObservation {
    pub account_id: String,
    pub reason: String,
    pub tracked: &'static str,
}

/// Everything published for one successful cycle.
#[derive(Clone, Debug)]
pub struct Observations {
    pub block_number: u64,
    pub chain_id: String,
    pub epoch_length: u64,
    pub epoch_start_height: u64,
    pub protocol_version: u32,
    pub seat_price: Stake,
    pub syncing: bool,
    pub version: String,
    pub build: String,
    pub validators: Vec<ValidatorObservation>,
    pub next_validators: Vec<StakeObservation>,
    pub proposals: Vec<StakeObservation>,
    pub kickouts: Vec<KickoutObservation>,
}

impl Observations {
    /// Value of the `epoch_start_height` label on validator-scoped series.
    pub fn epoch_label(&self) -> String {
        self.epoch_start_height.to_string()
    }

    /// Gauge value of the `chain_id` series.
    pub fn chain_id_value(&self) -> f64 {
        f64::from(fnv1a_32(&self.chain_id))
    }

    /// Gauge value of the `version_build` series.
    pub fn version_build_value(&self) -> f64 {
        f64::from(fnv1a_32(&self.build))
    }
}

/// Derives the observations of one cycle.
pub fn derive(snapshot: &Snapshot, tracked: &TrackedAccounts) -> Observations {
    let status = &snapshot.status;
    let set = &snapshot.validators;

    let labels = |account_id: &str, public_key: &str| ValidatorLabels {
        account_id: account_id.to_string(),
        public_key: public_key.to_string(),
        tracked: tracked.flag(account_id),
    };

    let ranks = rank_by_stake(&set.current_validators);

    let validators = set
        .current_validators
        .iter()
        .zip(ranks)
        .map(|(v, rank)| ValidatorObservation {
            labels: labels(v.account_id.as_str(), &v.public_key),
            stake: v.stake.clone(),
            rank,
            blocks_expected: v.num_expected_blocks,
            blocks_produced: v.num_produced_blocks,
            chunks_expected: v.num_expected_chunks,
            chunks_produced: v.num_produced_chunks,
            endorsements_expected: v.num_expected_endorsements,
            endorsements_produced: v.num_produced_endorsements,
            slashed: v.is_slashed,
        })
        .collect();

    let next_validators = set
        .next_validators
        .iter()
        .map(|v| StakeObservation {
            labels: labels(v.account_id.as_str(), &v.public_key),
            stake: v.stake.clone(),
        })
        .collect();

    let proposals = set
        .current_proposals
        .iter()
        .map(|p| StakeObservation {
            labels: labels(p.account_id.as_str(), &p.public_key),
            stake: p.stake.clone(),
        })
        .collect();

    let kickouts = set
        .prev_epoch_kickout
        .iter()
        .map(|k| KickoutObservation {
            account_id: k.account_id.to_string(),
            reason: k.reason.as_str().to_string(),
            tracked: tracked.flag(k.account_id.as_str()),
        })
        .collect();

    Observations {
        block_number: status.sync_info.latest_block_height,
        chain_id: status.chain_id.clone(),
        epoch_length: snapshot.protocol_config.epoch_length,
        epoch_start_height: set.epoch_start_height,
        protocol_version: snapshot.protocol_config.protocol_version,
        seat_price: seat_price(&set.current_validators),
        syncing: status.sync_info.syncing,
        version: status.version.version.clone(),
        build: status.version.build.clone(),
        validators,
        next_validators,
        proposals,
        kickouts,
    }
}

/// Rank of each validator, in input order.
///
/// Validators are ordered by stake, largest first. The sort is stable, so
/// equal stakes keep their response order and still get distinct ranks.
pub fn rank_by_stake(validators: &[CurrentValidator]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..validators.len()).collect();
    order.sort_by(|&a, &b| validators[b].stake.cmp(&validators[a].stake));

    let mut ranks = vec![0; validators.len()];
    for (position, index) in order.into_iter().enumerate() {
        ranks[index] = position + 1;
    }
    ranks
}

/// Smallest stake among the current validators; zero for an empty set.
pub fn seat_price(validators: &[CurrentValidator]) -> Stake {
    validators
        .iter()
        .map(|v| &v.stake)
        .min()
        .cloned()
        .unwrap_or_else(Stake::zero)
}

/// Production ratio in percent.
///
/// Nothing expected counts as full uptime. Ratios above 100 are kept as is.
pub fn uptime(produced: u64, expected: u64) -> f64 {
    if expected == 0 {
        return 100.0;
    }
    100.0 * produced as f64 / expected as f64
}

pub fn block_uptime(v: &CurrentValidator) -> f64 {
    uptime(v.num_produced_blocks, v.num_expected_blocks)
}

pub fn chunk_uptime(v: &CurrentValidator) -> f64 {
    uptime(v.num_produced_chunks, v.num_expected_chunks)
}

/// A validator is healthy when both block and chunk uptime reach
/// [`HEALTHY_UPTIME`].
pub fn is_healthy(v: &CurrentValidator) -> bool {
    block_uptime(v) >= HEALTHY_UPTIME && chunk_uptime(v) >= HEALTHY_UPTIME
}

/// 32-bit FNV-1a hash, used to turn identifying strings into gauge values.
pub fn fnv1a_32(s: &str) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    s.bytes()
        .fold(OFFSET, |hash, b| (hash ^ u32::from(b)).wrapping_mul(PRIME))
}
