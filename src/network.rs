use crate::error::ProviderError;
use std::fmt;

/// The network a provider is currently connected to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,
    pub chain_id: u64,
}

impl Network {
    pub fn new(name: impl Into<String>, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            chain_id,
        }
    }

    /// build the network from its chain id, naming it after the well known
    /// networks or `"unknown"`.
    pub fn from_chain_id(chain_id: u64) -> Self {
        Self::new(chain_name(chain_id), chain_id)
    }

    /// parse the `0x` prefixed hexadecimal chain id returned by `eth_chainId`
    pub fn from_hex_chain_id(chain_id: &str) -> Result<Self, ProviderError> {
        let digits = chain_id
            .strip_prefix("0x")
            .ok_or_else(|| ProviderError::internal(format!("Invalid chain id `{chain_id}'")))?;
        u64::from_str_radix(digits, 16)
            .map(Self::from_chain_id)
            .map_err(|error| ProviderError::internal(format!("Invalid chain id `{chain_id}': {error}")))
    }
}

/// name of the well known chains, `"unknown"` otherwise
pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "homestead",
        3 => "ropsten",
        4 => "rinkeby",
        5 => "goerli",
        10 => "optimism",
        42 => "kovan",
        56 => "bnb",
        61 => "classic",
        97 => "bnbt",
        100 => "xdai",
        137 => "matic",
        17000 => "holesky",
        42161 => "arbitrum",
        80001 => "maticmum",
        11155111 => "sepolia",
        _ => "unknown",
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}
