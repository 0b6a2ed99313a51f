//! One-stop construction of the API set.

use crate::{
    backend::HttpBackend,
    cart::CartApi,
    checkout::CheckoutApi,
    clubbed::ClubbedOrderApi,
    config::ClientConfig,
    errors::ClientError,
    matching::MatchingApi,
    session::SessionApi,
    settlement::SettlementApi,
    state::StateStore,
};

/// Builds the per-flow APIs over one HTTP backend and one state store.
///
/// Every API handed out shares the same connection pool, bearer token slot and state file, so signing in through
/// [`session`](Self::session) authenticates all of them, and a match recorded by [`matching`](Self::matching) is
/// visible to [`clubbed`](Self::clubbed) and [`settlement`](Self::settlement).
pub struct BuddyCartClient {
    backend: HttpBackend,
    store: StateStore,
}

impl BuddyCartClient {
    pub fn new(config: &ClientConfig, store: StateStore) -> Result<Self, ClientError> {
        Ok(Self { backend: HttpBackend::new(config)?, store })
    }

    /// Builds a client from the `BCART_*` environment variables and the default state file under the home
    /// directory.
    pub fn from_env() -> Result<Self, ClientError> {
        let config = ClientConfig::from_env_or_default();
        let store = StateStore::from_home()?;
        Self::new(&config, store)
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn session(&self) -> SessionApi<HttpBackend> {
        SessionApi::new(self.backend.clone(), self.store.clone())
    }

    pub fn cart(&self) -> CartApi<HttpBackend> {
        CartApi::new(self.backend.clone())
    }

    pub fn matching(&self) -> MatchingApi<HttpBackend> {
        MatchingApi::new(self.backend.clone(), self.store.clone())
    }

    pub fn clubbed(&self) -> ClubbedOrderApi<HttpBackend> {
        ClubbedOrderApi::new(self.backend.clone(), self.store.clone())
    }

    pub fn settlement(&self) -> SettlementApi<HttpBackend> {
        SettlementApi::new(self.backend.clone(), self.store.clone())
    }

    pub fn checkout(&self) -> CheckoutApi<HttpBackend> {
        CheckoutApi::new(self.backend.clone(), self.store.clone())
    }
}
