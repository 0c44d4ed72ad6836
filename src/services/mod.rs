//! Business logic services

pub mod accounts;
pub mod authorization;
pub mod cascade;
pub mod catalog;
pub mod events;
pub mod identity;
pub mod lifecycle;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EventsConfig},
    repository::DynStore,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub identity: identity::IdentityResolver,
    pub authorizer: authorization::Authorizer,
    pub accounts: accounts::AccountsService,
    pub catalog: catalog::CatalogService,
    pub lifecycle: lifecycle::LifecycleService,
    pub events: events::EventNotifier,
    pub store: DynStore,
}

impl Services {
    /// Create all services over the given store with the default rule bindings
    pub fn new(store: DynStore, auth_config: &AuthConfig, events_config: &EventsConfig) -> Self {
        Self::with_bindings(
            store,
            auth_config,
            events_config,
            Arc::new(authorization::RuleBindings::default()),
        )
    }

    pub fn with_bindings(
        store: DynStore,
        auth_config: &AuthConfig,
        events_config: &EventsConfig,
        bindings: Arc<authorization::RuleBindings>,
    ) -> Self {
        let credentials = identity::JwtCredentials::new(auth_config);
        let authorizer = authorization::Authorizer::new(store.clone(), bindings);
        let events = events::EventNotifier::new(events_config.channel_capacity);

        Self {
            identity: identity::IdentityResolver::new(Arc::new(credentials.clone())),
            accounts: accounts::AccountsService::new(store.clone(), authorizer.clone(), credentials),
            catalog: catalog::CatalogService::new(store.clone(), authorizer.clone()),
            lifecycle: lifecycle::LifecycleService::new(store.clone(), authorizer.clone(), events.clone()),
            authorizer,
            events,
            store,
        }
    }
}
