use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use tripdesk_authz::TokenService;
use tripdesk_db::{DocumentStore, Record, Repository};
use tripdesk_kernel::settings::Settings;

use crate::modules::packages::generator::{PackageCompleter, RemoteCompleter, TemplateCompleter};

/// Shared state handed to every module router.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn DocumentStore>,
    pub tokens: Arc<TokenService>,
    pub completer: Arc<dyn PackageCompleter>,
}

impl AppContext {
    pub fn new(settings: Settings, store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&settings.auth.jwt_secret, settings.auth.token_ttl_minutes);

        let template = TemplateCompleter::new(settings.generator.default_currency.clone());
        let completer: Arc<dyn PackageCompleter> = match &settings.generator.endpoint {
            Some(endpoint) => {
                tracing::info!(%endpoint, "package generation proxied to remote endpoint");
                Arc::new(RemoteCompleter::new(
                    endpoint.clone(),
                    settings.generator.api_key.clone(),
                    Duration::from_millis(settings.generator.timeout_ms),
                    template,
                )?)
            }
            None => Arc::new(template),
        };

        Ok(Self {
            settings: Arc::new(settings),
            store,
            tokens: Arc::new(tokens),
            completer,
        })
    }

    /// Typed repository over this context's store.
    pub fn repo<T: Record>(&self) -> Repository<T> {
        Repository::new(Arc::clone(&self.store))
    }
}

impl FromRef<AppContext> for Arc<TokenService> {
    fn from_ref(ctx: &AppContext) -> Self {
        Arc::clone(&ctx.tokens)
    }
}
