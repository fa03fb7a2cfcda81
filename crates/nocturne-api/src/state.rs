//! Application state wiring the dispatcher and its collaborators.
//!
//! The dispatcher is generic over its ports; `ConcreteDispatcher` pins it to
//! the infra implementations. Handlers only see it as `dyn TriggerDispatch`.

use std::sync::Arc;

use anyhow::Context;
use nocturne_core::dispatch::{ExplorationDispatcher, TriggerDispatch};
use nocturne_core::notify::CompletionNotifier;
use nocturne_infra::credentials::JsonCredentialStore;
use nocturne_infra::filesystem::LocalFileSystem;
use nocturne_infra::lookup::CommandSleepLookup;
use nocturne_infra::notify::HttpNotificationSink;
use nocturne_infra::process::ProcessSpawner;
use nocturne_types::config::{NocturneConfig, WebhookConfig};
use nocturne_types::session::SupervisionMode;
use secrecy::SecretString;

pub type ConcreteDispatcher = ExplorationDispatcher<
    CommandSleepLookup,
    ProcessSpawner,
    HttpNotificationSink,
    LocalFileSystem,
>;

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct AppState {
    pub webhook: Arc<WebhookConfig>,
    pub credentials: JsonCredentialStore,
    pub dispatcher: Arc<dyn TriggerDispatch>,
}

impl AppState {
    pub fn new(config: &NocturneConfig, dispatcher: Arc<dyn TriggerDispatch>) -> Self {
        Self {
            webhook: Arc::new(config.webhook.clone()),
            credentials: JsonCredentialStore::new(&config.credentials_path),
            dispatcher,
        }
    }
}

/// Build the dispatcher for `config` with the given notification token.
pub fn build_dispatcher(
    config: &NocturneConfig,
    notify_token: Option<SecretString>,
) -> anyhow::Result<ConcreteDispatcher> {
    if notify_token.is_none() && config.task.mode == SupervisionMode::Supervised {
        tracing::warn!("no notification token configured, completion notifications will be skipped");
    }

    let sink = HttpNotificationSink::new(
        config.notify.endpoint.clone(),
        notify_token,
        config.notify.timeout(),
    )
    .context("failed to build notification client")?;

    let fs = Arc::new(LocalFileSystem::new());
    let notifier = CompletionNotifier::new(sink, Arc::clone(&fs), config.notify.grace_period());

    Ok(ExplorationDispatcher::new(
        config.task.clone(),
        CommandSleepLookup::new(config.validation.clone()),
        ProcessSpawner::new(),
        notifier,
        fs,
    ))
}
