use cw_storage_plus::Map;

/// Validator operator address by orchestrator account
pub const ORCHESTRATOR_VALIDATOR: Map<&str, String> = Map::new("orchestrator_validator");
/// Ethereum signing address by validator operator address
pub const VALIDATOR_ETH_ADDRESS: Map<&str, String> = Map::new("validator_eth_address");
/// Reverse index keeping Ethereum addresses unique, lowercase keys
pub const ETH_ADDRESS_VALIDATOR: Map<&str, String> = Map::new("eth_address_validator");
