use serde::Deserialize;

/// Result of the `status` JSON-RPC method.
///
/// Only the fields the watcher exports are required; everything else is
/// decoded when present and defaulted otherwise, so that older or newer
/// nodes with slightly different payloads still decode.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeStatus {
    /// Chain identifier, e.g. `"mainnet"` or `"testnet"`.
    pub chain_id: String,
    #[serde(default)]
    pub latest_protocol_version: u32,
    #[serde(default)]
    pub protocol_version: u32,
    #[serde(default)]
    pub rpc_addr: Option<String>,
    pub sync_info: SyncInfo,
    pub version: NodeVersion,
}

/// Synchronisation info of the queried node.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SyncInfo {
    #[serde(default)]
    pub latest_block_hash: String,
    /// Height of the most recent block known to the node.
    pub latest_block_height: u64,
    #[serde(default)]
    pub latest_block_time: String,
    #[serde(default)]
    pub latest_state_root: String,
    #[serde(default)]
    pub earliest_block_hash: Option<String>,
    #[serde(default)]
    pub earliest_block_height: Option<u64>,
    #[serde(default)]
    pub earliest_block_time: Option<String>,
    /// `true` while the node is still catching up with the network.
    pub syncing: bool,
}

/// Software version of the queried node.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeVersion {
    pub version: String,
    pub build: String,
    #[serde(default)]
    pub rustc_version: Option<String>,
}
