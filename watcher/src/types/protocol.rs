use serde::Deserialize;

/// Subset of the `EXPERIMENTAL_protocol_config` result used by the watcher.
///
/// The full protocol config is several hundred fields of runtime costs; only
/// the epoch/versioning parameters and the seat/kickout knobs are decoded.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub chain_id: String,
    /// Number of blocks per epoch.
    pub epoch_length: u64,
    /// Protocol version currently deployed to the chain.
    pub protocol_version: u32,
    #[serde(default)]
    pub genesis_height: u64,
    #[serde(default)]
    pub num_block_producer_seats: u64,
    /// Minimum block production ratio (percent) before a validator is kicked out.
    #[serde(default)]
    pub block_producer_kickout_threshold: u8,
    /// Minimum chunk production ratio (percent) before a validator is kicked out.
    #[serde(default)]
    pub chunk_producer_kickout_threshold: u8,
}
