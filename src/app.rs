//! Application assembly: store, shared context, module registry, server.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tripdesk_db::{memory::InMemoryStore, DocumentStore, StoreBackend};
use tripdesk_kernel::settings::Settings;
use tripdesk_kernel::{InitCtx, ModuleRegistry};

use crate::context::AppContext;
use crate::modules;

/// A bootstrapped application.
pub struct App {
    pub ctx: AppContext,
    pub registry: ModuleRegistry,
}

impl App {
    /// Wire modules onto `store` and run their startup sequence.
    pub async fn assemble(settings: Settings, store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let ctx = AppContext::new(settings, store).context("failed to build application context")?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &ctx);

        let init_ctx = InitCtx {
            settings: &ctx.settings,
            store: ctx.store.as_ref(),
        };
        registry
            .bootstrap(&init_ctx)
            .await
            .context("module bootstrap failed")?;

        tracing::info!(
            core = registry.core_module_count(),
            custom = registry.custom_module_count(),
            store = ctx.store.backend_name(),
            "application assembled"
        );
        Ok(Self { ctx, registry })
    }

    /// Connect the configured store, then assemble.
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let store = tripdesk_db::connect(
            settings.database.backend,
            &settings.database.uri,
            &settings.database.database,
        )
        .await
        .context("failed to connect to the document store")?;
        Self::assemble(settings, store).await
    }

    /// Assemble over a fresh in-memory store regardless of configuration.
    pub async fn in_memory(mut settings: Settings) -> anyhow::Result<Self> {
        settings.database.backend = StoreBackend::Memory;
        Self::assemble(settings, Arc::new(InMemoryStore::new())).await
    }

    pub fn router(&self) -> Router {
        tripdesk_http::build_router(&self.registry, &self.ctx.settings)
    }

    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.registry.shutdown().await
    }
}

/// Serve until Ctrl-C or SIGTERM, then stop every module.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let app = App::from_settings(settings).await?;

    tripdesk_http::start_server(&app.registry, &app.ctx.settings, tripdesk_http::shutdown_signal())
        .await?;

    app.shutdown().await.context("module shutdown failed")?;
    tracing::info!("tripdesk stopped");
    Ok(())
}
