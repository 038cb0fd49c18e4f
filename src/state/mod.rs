pub mod bracket;
pub mod catalog;
pub mod limits;
pub mod sessions;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    auth::TokenVerifier,
    config::AppConfig,
    dao::arena_store::ArenaStore,
    error::ServiceError,
    services::identity::IdentityProvider,
};

use self::{catalog::Catalog, limits::RateLimits, sessions::SessionRegistry};

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, configuration and in-memory registries.
pub struct AppState {
    store: RwLock<Option<Arc<dyn ArenaStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    tokens: TokenVerifier,
    identity: Option<Arc<dyn IdentityProvider>>,
    catalog: Catalog,
    sessions: SessionRegistry,
    limits: RateLimits,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, identity: Option<Arc<dyn IdentityProvider>>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            tokens: TokenVerifier::new(&config.jwt_secret, config.token_ttl),
            identity,
            catalog: Catalog::new(config.cups.iter().cloned()),
            sessions: SessionRegistry::new(config.session_ttl),
            limits: RateLimits::new(&config.rate_limits),
            config,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn ArenaStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] while none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn ArenaStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn ArenaStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenVerifier {
        &self.tokens
    }

    /// OAuth code exchange, absent when no client credentials are configured.
    pub fn identity(&self) -> Option<&Arc<dyn IdentityProvider>> {
        self.identity.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn limits(&self) -> &RateLimits {
        &self.limits
    }
}
