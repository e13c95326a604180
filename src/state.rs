/*!
# Connection state

The [`ConnectionState`] record is owned by the [`Connector`] and only ever
mutated through [`ConnectionState::apply`], one [`Transition`] at a time.
Every transition keeps the following true:

- the account is the zero address if and only if the user did not authorize;
- the network and the balance are only set (non-default) once a query
  succeeded on an existing connection, and they are reset together;
- there is no connection without an authorized, non-zero account.

[`Connector`]: crate::Connector
*/

use crate::{Address, Network, error::ConnectionError};
use std::collections::BTreeSet;

/// the balance displayed before any successful query
pub const DEFAULT_BALANCE: &str = "0";

/// Fields of the [`ConnectionState`], used to declare which ones a
/// transition changed and which ones a stage depends on.
///
/// Each variant names the accessor of the same name on [`ConnectionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// the detection ran at least once
    Detected,
    /// a wallet provider was found
    HasProvider,
    /// the user granted access to their accounts
    IsAuthorized,
    /// the active account, zero while unauthorized
    Account,
    /// the handle used to query the chain
    Connection,
    /// the network the provider is on
    Network,
    /// the formatted balance of the active account
    Balance,
    /// the error of the last stage that failed
    Failure,
}

/// The set of fields a transition changed.
///
/// Returned by [`ConnectionState::apply`]. A transition that changed nothing
/// returns an empty set, and the [`Connector`] neither notifies its
/// subscribers nor re-triggers any stage for it. A stage re-runs when the
/// set contains one of its [`Stage::dependencies`].
///
/// [`Connector`]: crate::Connector
/// [`Stage::dependencies`]: crate::Stage::dependencies
pub type Changes = BTreeSet<Field>;

/// Every way the [`ConnectionState`] can change.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<C> {
    /// the provider detection ran
    Detected { has_provider: bool },
    /// the user granted access, `account` being the first account returned
    Authorized { account: Address },
    AuthorizationFailed { error: ConnectionError },
    /// the connection was built and both chain queries succeeded
    Connected {
        connection: C,
        network: Network,
        balance: String,
    },
    /// building the connection or querying the chain failed, `connection` is
    /// the handle if it could be built
    QueryFailed {
        connection: Option<C>,
        error: ConnectionError,
    },
}

/// Where the connection flow stands, derived from the [`ConnectionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// detection did not run yet
    Unknown,
    /// no wallet provider in this environment
    NoProvider,
    /// provider found, waiting on the authorization
    ProviderDetected,
    /// the user (or the wallet) refused the access
    Unauthorized,
    /// authorized, waiting on the chain queries
    Authorized,
    Connected,
    /// authorized, but the connection or a chain query failed
    QueryFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionState<C> {
    detected: bool,
    has_provider: bool,
    is_authorized: bool,
    account: Address,
    connection: Option<C>,
    network: Option<Network>,
    balance: String,
    failure: Option<ConnectionError>,
}

impl<C> Default for ConnectionState<C> {
    fn default() -> Self {
        Self {
            detected: false,
            has_provider: false,
            is_authorized: false,
            account: Address::ZERO,
            connection: None,
            network: None,
            balance: DEFAULT_BALANCE.to_owned(),
            failure: None,
        }
    }
}

impl<C> ConnectionState<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detected(&self) -> bool {
        self.detected
    }

    pub fn has_provider(&self) -> bool {
        self.has_provider
    }

    pub fn is_authorized(&self) -> bool {
        self.is_authorized
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn connection(&self) -> Option<&C> {
        self.connection.as_ref()
    }

    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    /// human readable balance, `"0"` until a query succeeded
    pub fn balance(&self) -> &str {
        &self.balance
    }

    /// the last failure of a stage, cleared by the next success
    pub fn failure(&self) -> Option<&ConnectionError> {
        self.failure.as_ref()
    }

    pub fn status(&self) -> Status {
        if !self.detected {
            Status::Unknown
        } else if !self.has_provider {
            Status::NoProvider
        } else if !self.is_authorized {
            match self.failure {
                Some(ConnectionError::AuthorizationDenied(_)) => Status::Unauthorized,
                _ => Status::ProviderDetected,
            }
        } else if self.network.is_some() {
            Status::Connected
        } else if self.failure.is_some() {
            Status::QueryFailed
        } else {
            Status::Authorized
        }
    }

    fn reset_chain_data(&mut self) {
        self.network = None;
        self.balance = DEFAULT_BALANCE.to_owned();
    }

    fn revoke(&mut self) {
        self.is_authorized = false;
        self.account = Address::ZERO;
        self.connection = None;
        self.reset_chain_data();
    }
}

impl<C: Clone + PartialEq> ConnectionState<C> {
    /// apply the transition and return the fields it changed
    ///
    /// Transitions that would break the invariants of the record (a
    /// connection while unauthorized, a zero account marked as authorized) are
    /// ignored or turned into the matching failure.
    pub fn apply(&mut self, transition: Transition<C>) -> Changes {
        let before = self.clone();

        match transition {
            Transition::Detected { has_provider } => {
                self.detected = true;
                // never reverts once a provider was seen
                self.has_provider |= has_provider;
                if !self.has_provider {
                    self.failure = Some(ConnectionError::ProviderAbsent);
                }
            }
            Transition::Authorized { account } if account.is_zero() => {
                self.revoke();
                self.failure = Some(ConnectionError::AuthorizationDenied(
                    crate::ProviderError::internal("The wallet returned the zero address"),
                ));
            }
            Transition::Authorized { account } => {
                if self.account != account {
                    // the chain data belonged to the previous account
                    self.connection = None;
                    self.reset_chain_data();
                }
                let account_changed = self.account != account;
                self.is_authorized = true;
                self.account = account;
                // a query failure still stands for the same account
                if account_changed
                    || matches!(self.failure, Some(ConnectionError::AuthorizationDenied(_)))
                {
                    self.failure = None;
                }
            }
            Transition::AuthorizationFailed { error } => {
                self.revoke();
                self.failure = Some(error);
            }
            Transition::Connected {
                connection,
                network,
                balance,
            } => {
                if self.is_connectable() {
                    self.connection = Some(connection);
                    self.network = Some(network);
                    self.balance = balance;
                    self.failure = None;
                }
            }
            Transition::QueryFailed { connection, error } => {
                if self.is_connectable() {
                    if connection.is_some() {
                        self.connection = connection;
                    }
                    self.reset_chain_data();
                    self.failure = Some(error);
                }
            }
        }

        before.diff(self)
    }

    fn is_connectable(&self) -> bool {
        self.is_authorized && !self.account.is_zero()
    }

    fn diff(&self, after: &Self) -> Changes {
        let mut changes = Changes::new();
        let mut check = |changed: bool, field: Field| {
            if changed {
                changes.insert(field);
            }
        };

        check(self.detected != after.detected, Field::Detected);
        check(self.has_provider != after.has_provider, Field::HasProvider);
        check(self.is_authorized != after.is_authorized, Field::IsAuthorized);
        check(self.account != after.account, Field::Account);
        check(self.connection != after.connection, Field::Connection);
        check(self.network != after.network, Field::Network);
        check(self.balance != after.balance, Field::Balance);
        check(self.failure != after.failure, Field::Failure);

        changes
    }
}
