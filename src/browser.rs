use crate::{
    Address, Config, Connector, Network, Provider,
    error::{ProviderError, ProviderErrorCode},
    ffi::{self, RequestArguments},
    units,
};
use alloy_primitives::U256;
use async_trait::async_trait;
use wasm_bindgen::JsValue;

/// The wallet provider injected by the browser extension as `window.ethereum`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProvider {
    block_tag: String,
}

impl Default for BrowserProvider {
    fn default() -> Self {
        Self::new(Config::default().block_tag)
    }
}

impl BrowserProvider {
    /// `block_tag` is the block balances are read at (`"latest"`, `"pending"`...)
    pub fn new(block_tag: impl Into<String>) -> Self {
        Self {
            block_tag: block_tag.into(),
        }
    }

    /// whether the injected provider claims to be MetaMask
    pub fn is_meta_mask(&self) -> bool {
        ffi::ethereum()
            .and_then(|provider| provider.is_meta_mask())
            .unwrap_or(false)
    }

    async fn request(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<JsValue, ProviderError> {
        let provider = ffi::ethereum().ok_or_else(|| {
            ProviderError::new(
                ProviderErrorCode::Disconnected,
                "window.ethereum is not available",
            )
        })?;
        let args = serde_wasm_bindgen::to_value(&RequestArguments { method, params })
            .map_err(|error| {
                ProviderError::internal(format!("Couldn't encode the `{method}' request: {error}"))
            })?;

        match provider.request(args).await {
            Ok(result) => Ok(result),
            Err(error) => serde_wasm_bindgen::from_value(error)
                .map_err(|decode_error| {
                    ProviderError::internal(format!(
                        "Couldn't decode the error content: {decode_error}"
                    ))
                })
                .and_then(Err),
        }
    }

    async fn request_string(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<String, ProviderError> {
        let result = self.request(method, params).await?;
        result.as_string().ok_or_else(|| {
            ProviderError::internal(format!("Unexpected `{method}' result: {result:?}"))
        })
    }
}

#[async_trait(?Send)]
impl Provider for BrowserProvider {
    fn is_present(&self) -> bool {
        ffi::ethereum().is_some()
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let accounts = self.request("eth_requestAccounts", Vec::new()).await?;
        let accounts: Vec<String> =
            serde_wasm_bindgen::from_value(accounts).map_err(|decode_error| {
                ProviderError::internal(format!("Couldn't decode the accounts: {decode_error}"))
            })?;

        accounts
            .iter()
            .map(|account| {
                account.parse::<Address>().map_err(|error| {
                    ProviderError::internal(format!("Invalid address `{account}': {error}"))
                })
            })
            .collect()
    }

    async fn network(&self) -> Result<Network, ProviderError> {
        let chain_id = self.request_string("eth_chainId", Vec::new()).await?;
        Network::from_hex_chain_id(&chain_id)
    }

    async fn balance(&self, address: &Address) -> Result<U256, ProviderError> {
        let params = vec![
            serde_json::Value::String(address.to_string()),
            serde_json::Value::String(self.block_tag.clone()),
        ];
        let balance = self.request_string("eth_getBalance", params).await?;
        units::from_quantity(&balance)
    }
}

impl Connector<BrowserProvider> {
    /// the connector over `window.ethereum`
    ///
    /// Nothing happens until [`Connector::start`] (or [`Connector::spawn`]) is
    /// called.
    pub fn browser(config: Config) -> Self {
        let provider = BrowserProvider::new(config.block_tag.clone());
        Self::new(provider, config)
    }
}
