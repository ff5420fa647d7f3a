use serde::{Deserialize, Deserializer};

use super::{AccountId, Stake};

/// Result of the `validators` JSON-RPC method.
///
/// All sequences keep the order in which the node returned them; the
/// derivation layer relies on that for stable tie-breaking when ranking.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ValidatorSet {
    #[serde(default)]
    pub current_validators: Vec<CurrentValidator>,
    #[serde(default)]
    pub next_validators: Vec<NextValidator>,
    #[serde(default)]
    pub current_proposals: Vec<Proposal>,
    /// Height of the first block of the current epoch.
    pub epoch_start_height: u64,
    /// Sequential number of the current epoch.
    #[serde(default)]
    pub epoch_height: u64,
    #[serde(default)]
    pub prev_epoch_kickout: Vec<Kickout>,
}

impl ValidatorSet {
    /// Looks up a current validator by exact account id.
    pub fn current(&self, account_id: &str) -> Option<&CurrentValidator> {
        self.current_validators
            .iter()
            .find(|v| v.account_id.as_str() == account_id)
    }
}

/// A validator of the current epoch, with its production statistics.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CurrentValidator {
    pub account_id: AccountId,
    pub public_key: String,
    pub stake: Stake,
    #[serde(default)]
    pub is_slashed: bool,
    #[serde(default)]
    pub shards: Vec<u64>,
    #[serde(default)]
    pub num_produced_blocks: u64,
    #[serde(default)]
    pub num_expected_blocks: u64,
    #[serde(default)]
    pub num_produced_chunks: u64,
    #[serde(default)]
    pub num_expected_chunks: u64,
    /// Only reported by nodes with stateless validation enabled.
    #[serde(default)]
    pub num_produced_endorsements: u64,
    #[serde(default)]
    pub num_expected_endorsements: u64,
}

/// A validator selected for the next epoch.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NextValidator {
    pub account_id: AccountId,
    pub public_key: String,
    pub stake: Stake,
    #[serde(default)]
    pub shards: Vec<u64>,
}

/// A staking proposal submitted during the current epoch.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Proposal {
    pub account_id: AccountId,
    pub public_key: String,
    pub stake: Stake,
    #[serde(default)]
    pub validator_stake_struct_version: Option<String>,
}

/// A validator removed from the set at the previous epoch boundary.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Kickout {
    pub account_id: AccountId,
    pub reason: KickoutReason,
}

/// Kickout reason, captured as compact JSON text at decode time.
///
/// The protocol does not guarantee a fixed schema for this payload (new
/// variants appear with protocol upgrades), so it is never interpreted, only
/// re-serialized and carried as an opaque label value. Key order follows
/// whatever the decoder produced.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KickoutReason(String);

impl KickoutReason {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for KickoutReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(KickoutReason(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALIDATORS: &str = include_str!("../../tests/fixtures/validators.json");

    #[test]
    fn validator_set_fixture_decodes() {
        let set: ValidatorSet = serde_json::from_str(VALIDATORS).expect("fixture should parse");

        assert_eq!(set.epoch_start_height, 142256359);
        assert_eq!(set.epoch_height, 2312);
        assert_eq!(set.current_validators.len(), 5);
        assert_eq!(set.next_validators.len(), 5);
        assert_eq!(set.current_proposals.len(), 5);
        assert_eq!(set.prev_epoch_kickout.len(), 2);

        let kiln = set.current("kiln.pool.f863973.m0").expect("kiln present");
        assert_eq!(kiln.num_expected_blocks, 92);
        assert_eq!(kiln.num_produced_chunks, 391);
        assert_eq!(kiln.num_expected_endorsements, 0);
        assert_eq!(
            kiln.stake,
            "6736422258840329637507414885764".parse::<Stake>().unwrap()
        );
    }

    #[test]
    fn kickout_reason_is_compact_json() {
        let json = r#"
        {
          "account_id": "x",
          "reason": {
            "NotEnoughBlocks": { "expected": 16, "produced": 0 }
          }
        }
        "#;
        let kickout: Kickout = serde_json::from_str(json).unwrap();
        assert_eq!(
            kickout.reason.as_str(),
            r#"{"NotEnoughBlocks":{"expected":16,"produced":0}}"#
        );
    }

    #[test]
    fn kickout_reason_accepts_bare_string_variants() {
        let kickout: Kickout =
            serde_json::from_str(r#"{"account_id": "y", "reason": "Slashed"}"#).unwrap();
        assert_eq!(kickout.reason.as_str(), r#""Slashed""#);
    }

    #[test]
    fn negative_stake_fails_to_decode() {
        let json = r#"{"account_id": "a", "public_key": "k", "stake": "-5"}"#;
        assert!(serde_json::from_str::<NextValidator>(json).is_err());
    }

    #[test]
    fn missing_sequences_decode_as_empty() {
        let set: ValidatorSet = serde_json::from_str(r#"{"epoch_start_height": 7}"#).unwrap();
        assert!(set.current_validators.is_empty());
        assert!(set.prev_epoch_kickout.is_empty());
    }
}
