use crate::{
    Address, Network,
    error::{ConnectionError, ProviderError},
};
use alloy_primitives::U256;
use async_trait::async_trait;
use std::{fmt, rc::Rc};

/// Access to a wallet provider and, through it, to a chain node.
///
/// In the browser this is `window.ethereum` (see [`BrowserProvider`]); any
/// other implementation can be injected in the [`Connector`], which is how the
/// connection flow is exercised without a browser.
///
/// All the calls happen on a single thread, hence `?Send`.
///
/// [`BrowserProvider`]: crate::BrowserProvider
/// [`Connector`]: crate::Connector
#[async_trait(?Send)]
pub trait Provider {
    /// check whether the provider is present in the host environment
    ///
    /// Must not have side effects: calling it twice on the same environment
    /// returns the same answer.
    fn is_present(&self) -> bool;

    /// ask the user for access to their accounts (`eth_requestAccounts`)
    ///
    /// May show a permission prompt.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// the network the provider is currently on
    async fn network(&self) -> Result<Network, ProviderError>;

    /// the balance of `address`, in wei
    async fn balance(&self, address: &Address) -> Result<U256, ProviderError>;
}

/// run the provider detection
pub fn detect<P: Provider + ?Sized>(provider: &P) -> bool {
    provider.is_present()
}

/// Request access to the accounts and pick the active one.
///
/// The first address returned by the wallet becomes the active account. An
/// empty list or a zero address is a denial: there is no account we can use.
pub async fn authorize<P: Provider + ?Sized>(provider: &P) -> Result<Address, ConnectionError> {
    let accounts = provider
        .request_accounts()
        .await
        .map_err(ConnectionError::AuthorizationDenied)?;

    match accounts.first() {
        None => Err(ConnectionError::AuthorizationDenied(ProviderError::internal(
            "The wallet returned no accounts",
        ))),
        Some(account) if account.is_zero() => Err(ConnectionError::AuthorizationDenied(
            ProviderError::internal("The wallet returned the zero address"),
        )),
        Some(account) => Ok(*account),
    }
}

/// A handle over an authorized provider, used to query the chain.
pub struct Connection<P> {
    provider: Rc<P>,
}

/// The result of a successful chain query: both values or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    pub network: Network,
    pub balance: U256,
}

impl<P: Provider> Connection<P> {
    /// wrap the provider into a connection handle
    ///
    /// Fails only if the provider went away since it was detected.
    pub fn build(provider: Rc<P>) -> Result<Self, ConnectionError> {
        if !provider.is_present() {
            return Err(ConnectionError::ConnectionOrQueryFailure(
                ProviderError::internal("The wallet provider is no longer available"),
            ));
        }
        Ok(Self { provider })
    }

    pub async fn network(&self) -> Result<Network, ProviderError> {
        self.provider.network().await
    }

    pub async fn balance(&self, account: &Address) -> Result<U256, ProviderError> {
        self.provider.balance(account).await
    }

    /// query the network and the balance of `account`
    ///
    /// If either query fails the whole query fails, there is never a network
    /// without a balance.
    pub async fn query(&self, account: &Address) -> Result<ChainInfo, ConnectionError> {
        let network = self
            .network()
            .await
            .map_err(ConnectionError::ConnectionOrQueryFailure)?;
        let balance = self
            .balance(account)
            .await
            .map_err(ConnectionError::ConnectionOrQueryFailure)?;

        Ok(ChainInfo { network, balance })
    }
}

impl<P> Clone for Connection<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Rc::clone(&self.provider),
        }
    }
}

/// two handles are equal if they go through the same provider
impl<P> PartialEq for Connection<P> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.provider, &other.provider)
    }
}

impl<P> fmt::Debug for Connection<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ProviderErrorCode, testing::FakeProvider};
    use futures::executor::block_on;

    #[test]
    fn detection_is_idempotent() {
        let present = FakeProvider::default();
        let absent = FakeProvider::absent();

        assert_eq!(detect(&present), detect(&present));
        assert!(detect(&present));
        assert_eq!(detect(&absent), detect(&absent));
        assert!(!detect(&absent));
    }

    #[test]
    fn authorize_takes_the_first_account() {
        let provider = FakeProvider::default()
            .with_accounts(vec![FakeProvider::alice(), FakeProvider::bob()]);

        assert_eq!(block_on(authorize(&provider)), Ok(FakeProvider::alice()));
    }

    #[test]
    fn authorize_rejections() {
        let rejected = FakeProvider::default().rejecting_accounts();
        assert!(matches!(
            block_on(authorize(&rejected)),
            Err(ConnectionError::AuthorizationDenied(ProviderError {
                code: ProviderErrorCode::UserRejectedRequest,
                ..
            }))
        ));

        let empty = FakeProvider::default().with_accounts(Vec::new());
        assert!(matches!(
            block_on(authorize(&empty)),
            Err(ConnectionError::AuthorizationDenied(_))
        ));

        let zero = FakeProvider::default().with_accounts(vec![Address::ZERO]);
        assert!(matches!(
            block_on(authorize(&zero)),
            Err(ConnectionError::AuthorizationDenied(_))
        ));
    }

    #[test]
    fn build_requires_a_present_provider() {
        assert!(Connection::build(Rc::new(FakeProvider::default())).is_ok());
        assert!(matches!(
            Connection::build(Rc::new(FakeProvider::absent())),
            Err(ConnectionError::ConnectionOrQueryFailure(_))
        ));
    }

    #[test]
    fn query_is_all_or_nothing() {
        let connection = Connection::build(Rc::new(FakeProvider::default())).unwrap();
        let info = block_on(connection.query(&FakeProvider::alice())).unwrap();
        assert_eq!(info.network, Network::new("mainnet", 1));
        assert_eq!(crate::units::format_ether(info.balance).unwrap(), "2.5");

        let connection =
            Connection::build(Rc::new(FakeProvider::default().failing_balance())).unwrap();
        assert!(matches!(
            block_on(connection.query(&FakeProvider::alice())),
            Err(ConnectionError::ConnectionOrQueryFailure(_))
        ));

        let connection =
            Connection::build(Rc::new(FakeProvider::default().failing_network())).unwrap();
        assert!(block_on(connection.query(&FakeProvider::alice())).is_err());
    }
}
