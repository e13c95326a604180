use crate::{
    Address,
    config::{Config, StalePolicy},
    error::ConnectionError,
    provider::{self, ChainInfo, Connection, Provider},
    state::{Changes, ConnectionState, Field, Status, Transition},
    units,
};
use log::{debug, info, warn};
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::Rc,
};

/// The state record as observed through a [`Connector`] over the provider `P`.
pub type State<P> = ConnectionState<Connection<P>>;

type Subscriber<P> = Rc<dyn Fn(&State<P>)>;

/// The asynchronous stages the [`Connector`] runs after the detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// request access to the accounts
    Authorize,
    /// build the connection then query the network and the balance
    Query,
}

impl Stage {
    /// every stage, in the order they run on a fresh [`Connector`]
    ///
    /// [`Stage::Query`] depends on the outcome of [`Stage::Authorize`], so
    /// when one change triggers both, they are queued in this order.
    pub const ALL: [Self; 2] = [Self::Authorize, Self::Query];

    /// the fields whose change may re-trigger the stage
    pub fn dependencies(self) -> &'static [Field] {
        match self {
            Self::Authorize => &[Field::HasProvider],
            Self::Query => &[Field::IsAuthorized, Field::Account],
        }
    }

    /// whether the stage can run on the given state
    pub fn is_ready<C>(self, state: &ConnectionState<C>) -> bool {
        match self {
            Self::Authorize => state.has_provider(),
            Self::Query => state.is_authorized() && !state.account().is_zero(),
        }
    }

    fn is_triggered_by(self, changes: &Changes) -> bool {
        self.dependencies()
            .iter()
            .any(|field| changes.contains(field))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorize => write!(f, "authorize"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// identifies one run of a stage so its result can be matched against the
/// state it was started from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    stage: Stage,
    generation: u64,
    account: Address,
}

struct Inner<P> {
    provider: Rc<P>,
    config: Config,
    state: RefCell<State<P>>,
    authorize_generation: Cell<u64>,
    query_generation: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber<P>>>,
}

/// The connection state machine.
///
/// Owns the [`ConnectionState`] and sequences the stages over the
/// [`Provider`]: detection, then authorization once a provider is found, then
/// connection and chain queries once an account is authorized. A stage only
/// runs when one of its [dependencies] changes, the connector does nothing on
/// its own otherwise.
///
/// Everything runs on one thread: the state is never borrowed across an
/// `.await`, so each transition is applied in one go and subscribers always
/// see a consistent state.
///
/// ```no_run
/// # use eth_connector::{BrowserProvider, Config, Connector};
/// # async fn test() -> anyhow::Result<()> {
/// let connector = Connector::new(BrowserProvider::default(), Config::default());
/// connector.subscribe(|state| {
///     println!("{:?}: {} ({})", state.status(), state.account(), state.balance());
/// });
/// connector.start().await;
/// # Ok(()) }
/// ```
///
/// [dependencies]: Stage::dependencies
pub struct Connector<P> {
    inner: Rc<Inner<P>>,
}

impl<P> Clone for Connector<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: Provider + 'static> Connector<P> {
    pub fn new(provider: P, config: Config) -> Self {
        Self::with_provider(Rc::new(provider), config)
    }

    /// build the connector over a shared provider
    pub fn with_provider(provider: Rc<P>, config: Config) -> Self {
        Self {
            inner: Rc::new(Inner {
                provider,
                config,
                state: RefCell::new(ConnectionState::new()),
                authorize_generation: Cell::new(0),
                query_generation: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// a copy of the current state
    pub fn snapshot(&self) -> State<P> {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> Status {
        self.inner.state.borrow().status()
    }

    /// the stage failure that left the connector in its current state, if any
    pub fn failure(&self) -> Option<ConnectionError> {
        self.inner.state.borrow().failure().cloned()
    }

    /// call `subscriber` with the current state now and after every change
    pub fn subscribe(&self, subscriber: impl Fn(&State<P>) + 'static) {
        let subscriber: Subscriber<P> = Rc::new(subscriber);
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::clone(&subscriber));
        subscriber(&self.snapshot());
    }

    /// run the detection and every stage it leads to
    ///
    /// Returns once the state settled: either no provider, a failed
    /// authorization, or the chain queries completed (successfully or not).
    pub async fn start(&self) {
        let has_provider = provider::detect(&*self.inner.provider);
        if has_provider {
            info!("Wallet provider detected");
        } else {
            info!("No wallet provider detected");
        }

        let changes = self.dispatch(Transition::Detected { has_provider });
        self.react(changes).await;
    }

    /// ask for the authorization again, e.g. after the user rejected it
    pub async fn reauthorize(&self) {
        self.trigger(Stage::Authorize).await
    }

    /// build the connection and query the chain again for the current account
    pub async fn refresh(&self) {
        self.trigger(Stage::Query).await
    }

    /// run [`Connector::start`] in the background on the browser's event loop
    #[cfg(feature = "browser")]
    pub fn spawn(&self) {
        let connector = self.clone();
        wasm_bindgen_futures::spawn_local(async move { connector.start().await });
    }

    async fn trigger(&self, stage: Stage) {
        if !stage.is_ready(&*self.inner.state.borrow()) {
            debug!("Not running the {stage} stage, its preconditions are not met");
            return;
        }

        let changes = self.run(stage).await;
        self.react(changes).await;
    }

    /// run every stage triggered by `changes`, then the ones those trigger
    async fn react(&self, changes: Changes) {
        let mut pending = VecDeque::from(self.triggered(&changes));

        while let Some(stage) = pending.pop_front() {
            let changes = self.run(stage).await;
            pending.extend(self.triggered(&changes));
        }
    }

    fn triggered(&self, changes: &Changes) -> Vec<Stage> {
        let state = self.inner.state.borrow();
        Stage::ALL
            .into_iter()
            .filter(|stage| stage.is_triggered_by(changes) && stage.is_ready(&*state))
            .collect()
    }

    async fn run(&self, stage: Stage) -> Changes {
        let ticket = self.issue(stage);
        debug!("Running the {stage} stage ({})", ticket.generation);

        let transition = match stage {
            Stage::Authorize => match provider::authorize(&*self.inner.provider).await {
                Ok(account) => {
                    info!("Authorized account {account}");
                    Transition::Authorized { account }
                }
                Err(error) => {
                    warn!("{error}");
                    Transition::AuthorizationFailed { error }
                }
            },
            Stage::Query => self.connect(&ticket.account).await,
        };

        if self.is_stale(&ticket) {
            debug!(
                "Discarding the outdated result of the {stage} stage ({})",
                ticket.generation
            );
            return Changes::new();
        }

        self.dispatch(transition)
    }

    async fn connect(&self, account: &Address) -> Transition<Connection<P>> {
        let connection = match Connection::build(Rc::clone(&self.inner.provider)) {
            Ok(connection) => connection,
            Err(error) => {
                warn!("{error}");
                return Transition::QueryFailed {
                    connection: None,
                    error,
                };
            }
        };

        match connection.query(account).await {
            Ok(ChainInfo { network, balance }) => {
                match units::format_units(balance, self.inner.config.decimals) {
                    Ok(balance) => {
                        info!("Connected to {network}, balance of {account} is {balance}");
                        Transition::Connected {
                            connection,
                            network,
                            balance,
                        }
                    }
                    Err(error) => {
                        warn!("{error}");
                        Transition::QueryFailed {
                            connection: Some(connection),
                            error: ConnectionError::ConnectionOrQueryFailure(error),
                        }
                    }
                }
            }
            Err(error) => {
                warn!("{error}");
                Transition::QueryFailed {
                    connection: Some(connection),
                    error,
                }
            }
        }
    }

    fn generation(&self, stage: Stage) -> &Cell<u64> {
        match stage {
            Stage::Authorize => &self.inner.authorize_generation,
            Stage::Query => &self.inner.query_generation,
        }
    }

    fn issue(&self, stage: Stage) -> Ticket {
        let generation = self.generation(stage);
        generation.set(generation.get() + 1);

        Ticket {
            stage,
            generation: generation.get(),
            account: *self.inner.state.borrow().account(),
        }
    }

    fn is_stale(&self, ticket: &Ticket) -> bool {
        // chain data for another account can never be applied
        if ticket.stage == Stage::Query && self.inner.state.borrow().account() != &ticket.account
        {
            return true;
        }

        let outdated = self.generation(ticket.stage).get() != ticket.generation;
        outdated && self.inner.config.stale_policy == StalePolicy::Discard
    }

    fn dispatch(&self, transition: Transition<Connection<P>>) -> Changes {
        let (changes, snapshot) = {
            let mut state = self.inner.state.borrow_mut();
            let changes = state.apply(transition);
            (changes, state.clone())
        };

        if !changes.is_empty() {
            debug!("State changed: {changes:?}");
            // subscribers may subscribe in turn, do not hold the borrow
            let subscribers = self.inner.subscribers.borrow().clone();
            for subscriber in subscribers {
                subscriber(&snapshot);
            }
        }

        changes
    }
}

impl<P> fmt::Debug for Connector<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}
