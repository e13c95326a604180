//! In-memory provider for the tests.

use crate::{
    Address, Network, Provider,
    error::{ProviderError, ProviderErrorCode},
};
use alloy_primitives::U256;
use async_trait::async_trait;
use futures::channel::oneshot;
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

type Hook = Box<dyn Fn(&Address)>;

pub struct FakeProvider {
    present: bool,
    /// scripted responses to `eth_requestAccounts`, the last one repeats
    accounts: RefCell<VecDeque<Result<Vec<Address>, ProviderError>>>,
    /// one gate per call, the call waits until the gate is opened
    account_gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
    balance_gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
    network: Result<Network, ProviderError>,
    balance: Result<U256, ProviderError>,
    query_hook: Option<Hook>,
    pub account_requests: Cell<usize>,
    pub network_requests: Cell<usize>,
    pub balance_requests: Cell<usize>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            present: true,
            accounts: RefCell::new(VecDeque::from([Ok(vec![Self::alice()])])),
            account_gates: RefCell::default(),
            balance_gates: RefCell::default(),
            network: Ok(Network::new("mainnet", 1)),
            balance: Ok(U256::from(2_500_000_000_000_000_000u128)),
            query_hook: None,
            account_requests: Cell::new(0),
            network_requests: Cell::new(0),
            balance_requests: Cell::new(0),
        }
    }
}

impl FakeProvider {
    pub fn alice() -> Address {
        "0xabc0000000000000000000000000000000000001"
            .parse()
            .expect("valid address")
    }

    pub fn bob() -> Address {
        "0xb0b0000000000000000000000000000000000002"
            .parse()
            .expect("valid address")
    }

    pub fn rejection() -> ProviderError {
        ProviderError::new(
            ProviderErrorCode::UserRejectedRequest,
            "User rejected the request.",
        )
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::default()
        }
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.with_account_responses(vec![Ok(accounts)])
    }

    pub fn with_account_responses(
        self,
        responses: Vec<Result<Vec<Address>, ProviderError>>,
    ) -> Self {
        *self.accounts.borrow_mut() = responses.into();
        self
    }

    pub fn rejecting_accounts(self) -> Self {
        self.with_account_responses(vec![Err(Self::rejection())])
    }

    pub fn failing_network(mut self) -> Self {
        self.network = Err(ProviderError::new(
            ProviderErrorCode::ChainDisconnected,
            "chain unreachable",
        ));
        self
    }

    pub fn failing_balance(mut self) -> Self {
        self.balance = Err(ProviderError::internal("malformed balance"));
        self
    }

    /// called with the account on every balance query
    pub fn with_query_hook(mut self, hook: impl Fn(&Address) + 'static) -> Self {
        self.query_hook = Some(Box::new(hook));
        self
    }

    /// hold the next `eth_requestAccounts` call until the returned sender fires
    pub fn gate_accounts(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.account_gates.borrow_mut().push_back(receiver);
        sender
    }

    /// hold the next balance query until the returned sender fires
    pub fn gate_balance(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.balance_gates.borrow_mut().push_back(receiver);
        sender
    }
}

#[async_trait(?Send)]
impl Provider for FakeProvider {
    fn is_present(&self) -> bool {
        self.present
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.account_requests.set(self.account_requests.get() + 1);

        let response = {
            let mut accounts = self.accounts.borrow_mut();
            if accounts.len() > 1 {
                accounts.pop_front()
            } else {
                accounts.front().cloned()
            }
        };
        let gate = self.account_gates.borrow_mut().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        response.unwrap_or_else(|| Err(Self::rejection()))
    }

    async fn network(&self) -> Result<Network, ProviderError> {
        self.network_requests.set(self.network_requests.get() + 1);
        self.network.clone()
    }

    async fn balance(&self, address: &Address) -> Result<U256, ProviderError> {
        self.balance_requests.set(self.balance_requests.get() + 1);
        if let Some(hook) = &self.query_hook {
            hook(address);
        }

        let gate = self.balance_gates.borrow_mut().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if *address == Self::bob() {
            return self.balance.clone().map(|wei| wei * U256::from(2));
        }
        self.balance.clone()
    }
}
