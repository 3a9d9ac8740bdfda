//! Infrastructure wiring: stores, delivery chain, and the core services.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use shopfront_catalog::{CatalogStore, InMemoryCatalogStore};
use shopfront_delivery::{ChannelChain, DeliveryChannel, MailApiChannel, MailApiConfig};
use shopfront_orders::{InMemoryOrderStore, OrderIntake, OrderStore};
use shopfront_restock::{
    DispatcherConfig, InMemoryProfileStore, InMemorySubscriptionStore, ProfileStore,
    ReplenishmentDispatcher, RestockService, SubscriptionStore,
};

/// Delivery configuration pulled from the environment.
#[derive(Debug, Clone, Default)]
pub struct DeliveryConfig {
    /// Primary provider; `None` leaves the chain starting at the sandbox.
    pub primary: Option<MailApiConfig>,
    /// Disposable sandbox provider.
    pub sandbox: Option<MailApiConfig>,
    pub attempt_timeout: Duration,
}

impl DeliveryConfig {
    pub fn from_env() -> Self {
        let primary = mail_config_from_env("MAIL_API_URL", "MAIL_API_TOKEN");
        let sandbox = mail_config_from_env("SANDBOX_MAIL_API_URL", "SANDBOX_MAIL_API_TOKEN");
        if primary.is_none() {
            warn!("MAIL_API_URL not set; confirmation mail will use the sandbox or sink");
        }
        let attempt_timeout = std::env::var("DELIVERY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(5));
        Self {
            primary,
            sandbox,
            attempt_timeout,
        }
    }

    fn build_chain(&self) -> ChannelChain {
        let mut channels: Vec<Arc<dyn DeliveryChannel>> = Vec::new();
        if let Some(primary) = &self.primary {
            channels.push(Arc::new(MailApiChannel::primary(primary.clone())));
        }
        if let Some(sandbox) = &self.sandbox {
            channels.push(Arc::new(MailApiChannel::sandbox(sandbox.clone())));
        }
        // The chain appends the sink terminal itself.
        ChannelChain::new(channels).with_attempt_timeout(self.attempt_timeout)
    }
}

fn mail_config_from_env(url_var: &str, token_var: &str) -> Option<MailApiConfig> {
    let base_url = std::env::var(url_var).ok()?;
    let api_token = std::env::var(token_var).unwrap_or_default();
    let sender = std::env::var("MAIL_SENDER").unwrap_or_else(|_| "orders@shopfront.test".into());
    Some(MailApiConfig {
        base_url,
        api_token,
        sender,
    })
}

/// Everything the request handlers need, behind one `Arc`.
pub struct AppServices {
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub intake: OrderIntake<Arc<dyn CatalogStore>, Arc<dyn OrderStore>>,
    pub restock: RestockService,
    pub dispatcher: ReplenishmentDispatcher,
}

/// Build the in-memory service graph with the given delivery chain.
pub fn build_services_with_chain(chain: Arc<ChannelChain>) -> AppServices {
    let catalog: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalogStore::new());
    let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
    let profiles: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
    let subscriptions: Arc<dyn SubscriptionStore> = Arc::new(InMemorySubscriptionStore::new());

    let fan_out = DispatcherConfig::default().with_max_concurrent(
        std::env::var("FANOUT_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4),
    );

    AppServices {
        intake: OrderIntake::new(catalog.clone(), orders.clone(), chain.clone()),
        restock: RestockService::new(catalog.clone(), profiles.clone(), subscriptions.clone()),
        dispatcher: ReplenishmentDispatcher::new(
            catalog.clone(),
            profiles.clone(),
            subscriptions.clone(),
            chain,
            fan_out,
        ),
        catalog,
        orders,
        profiles,
        subscriptions,
    }
}

/// Build services from environment configuration.
pub fn build_services(delivery: DeliveryConfig) -> AppServices {
    build_services_with_chain(Arc::new(delivery.build_chain()))
}
