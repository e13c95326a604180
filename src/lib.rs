/*!
# Ethereum Connector for EIP-1193 wallets

This library is meant to be used for web applications that need to connect to
a browser wallet (MetaMask or any wallet injecting `window.ethereum`). It
manages the whole connection flow and exposes it as one consistent state.

## Features

- Detect the wallet provider
- Request the authorization to access the accounts
- Retrieve the network and the balance of the active account
- Notify subscribers of every state change

## Usage

Build the [`Connector`] over the browser's provider, subscribe to its state
and start it:

```no_run
use eth_connector::{Config, Connector};

# async fn test() -> anyhow::Result<()> {
let connector = Connector::browser(Config::default());
connector.subscribe(|state| {
    if let Some(network) = state.network() {
        println!("{} on {network}: {}", state.account(), state.balance());
    }
});
connector.start().await;
# Ok(()) }
```

The connector never fails: the outcome of every stage, errors included, is
reflected in the [`ConnectionState`] (see [`ConnectionState::status`] and
[`ConnectionState::failure`]).

Any [`Provider`] implementation can be used in place of the browser's one.
*/

#[cfg(feature = "browser")]
mod browser;
pub mod config;
mod connector;
pub mod error;
#[cfg(feature = "browser")]
pub mod ffi;
mod network;
mod provider;
pub mod state;
#[cfg(test)]
mod testing;
pub mod units;

#[cfg(feature = "browser")]
pub use self::browser::BrowserProvider;
pub use alloy_primitives::{Address, U256};

pub use self::{
    config::{Config, StalePolicy},
    connector::{Connector, Stage, State},
    error::{ConnectionError, ProviderError, ProviderErrorCode},
    network::{Network, chain_name},
    provider::{ChainInfo, Connection, Provider, authorize, detect},
    state::{ConnectionState, Status, Transition},
};
