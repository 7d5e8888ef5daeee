use anyhow::Context;
use std::sync::Arc;

use tripdesk_db::{CollectionSpec, DocumentStore};

use crate::module::{InitCtx, Module};

/// Core module initialization order
const CORE_MODULE_ORDER: &[&str] = &[
    "auth",  // Authentication seeds the bootstrap admin
    "users", // User administration
             // Note: HTTP server is started separately after all modules are initialized
];

/// Module registry for managing module lifecycle with core/custom separation
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            core_modules: Vec::new(),
            custom_modules: Vec::new(),
        }
    }

    /// Register a core module with the registry
    pub fn register_core(&mut self, module: Arc<dyn Module>) {
        self.core_modules.push(module);
    }

    /// Register a custom module with the registry
    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// Get all registered modules (core + custom)
    pub fn modules(&self) -> Vec<&Arc<dyn Module>> {
        let mut all_modules = Vec::new();
        all_modules.extend(self.core_modules.iter());
        all_modules.extend(self.custom_modules.iter());
        all_modules
    }

    /// Get a module by name (searches both core and custom modules)
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.core_modules
            .iter()
            .find(|module| module.name() == name)
            .or_else(|| {
                self.custom_modules
                    .iter()
                    .find(|module| module.name() == name)
            })
    }

    pub fn core_module_count(&self) -> usize {
        self.core_modules.len()
    }

    pub fn custom_module_count(&self) -> usize {
        self.custom_modules.len()
    }

    /// Core modules in `CORE_MODULE_ORDER`, then any core module not listed there
    fn ordered_core_modules(&self) -> Vec<&Arc<dyn Module>> {
        let mut ordered: Vec<&Arc<dyn Module>> = CORE_MODULE_ORDER
            .iter()
            .filter_map(|name| self.core_modules.iter().find(|m| m.name() == *name))
            .collect();
        ordered.extend(
            self.core_modules
                .iter()
                .filter(|m| !CORE_MODULE_ORDER.contains(&m.name())),
        );
        ordered
    }

    /// Initialize core modules in the correct order
    pub async fn init_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            "initializing core modules in order: {:?}",
            CORE_MODULE_ORDER
        );

        for module in self.ordered_core_modules() {
            tracing::info!(module = module.name(), "initializing core module");

            module.init(ctx).await.with_context(|| {
                format!("failed to initialize core module '{}'", module.name())
            })?;
        }

        Ok(())
    }

    /// Initialize custom modules
    pub async fn init_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} custom modules", self.custom_modules.len());

        for module in &self.custom_modules {
            tracing::info!(module = module.name(), "initializing custom module");

            module.init(ctx).await.with_context(|| {
                format!("failed to initialize custom module '{}'", module.name())
            })?;
        }

        Ok(())
    }

    /// Start core modules in the correct order
    pub async fn start_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting core modules in order: {:?}", CORE_MODULE_ORDER);

        for module in self.ordered_core_modules() {
            tracing::info!(module = module.name(), "starting core module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start core module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start custom modules
    pub async fn start_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} custom modules", self.custom_modules.len());

        for module in &self.custom_modules {
            tracing::info!(module = module.name(), "starting custom module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start custom module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop custom modules first (reverse order)
    pub async fn stop_custom_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} custom modules", self.custom_modules.len());

        for module in self.custom_modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping custom module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop custom module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop core modules in reverse order
    pub async fn stop_core_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping core modules in reverse order");

        for module in self.ordered_core_modules().into_iter().rev() {
            tracing::info!(module = module.name(), "stopping core module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop core module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect all collection declarations from all modules (core + custom)
    pub fn collect_collections(&self) -> Vec<(String, CollectionSpec)> {
        let mut collections = Vec::new();

        for module in self.modules() {
            for spec in module.collections() {
                collections.push((module.name().to_string(), spec));
            }
        }

        // Sort by module name and collection name for deterministic ordering
        collections.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(b.1.name)));

        collections
    }

    /// Create every declared collection and its indexes
    pub async fn ensure_collections(&self, store: &dyn DocumentStore) -> anyhow::Result<()> {
        for (module, spec) in self.collect_collections() {
            tracing::info!(module = %module, collection = spec.name, "ensuring collection");
            store
                .ensure_collection(&spec)
                .await
                .with_context(|| format!("failed to ensure collection '{}'", spec.name))?;
        }
        Ok(())
    }

    /// Full startup sequence: collections, init, start
    pub async fn bootstrap(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.ensure_collections(ctx.store).await?;
        self.init_core_modules(ctx).await?;
        self.init_custom_modules(ctx).await?;
        self.start_core_modules(ctx).await?;
        self.start_custom_modules(ctx).await?;
        Ok(())
    }

    /// Full shutdown sequence: custom modules first, then core
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.stop_custom_modules().await?;
        self.stop_core_modules().await
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tripdesk_db::memory::InMemoryStore;

    struct TestModule {
        name: &'static str,
        inits: AtomicUsize,
    }

    impl TestModule {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                inits: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn collections(&self) -> Vec<CollectionSpec> {
            vec![CollectionSpec::new(self.name, &["status"])]
        }
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
    }

    #[test]
    fn test_collection_collection_is_sorted() {
        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(TestModule::new("leads")));
        registry.register_core(Arc::new(TestModule::new("auth")));

        let names: Vec<_> = registry
            .collect_collections()
            .into_iter()
            .map(|(module, spec)| (module, spec.name))
            .collect();
        assert_eq!(
            names,
            vec![("auth".to_string(), "auth"), ("leads".to_string(), "leads")]
        );
    }

    #[tokio::test]
    async fn test_module_lifecycle() {
        let mut registry = ModuleRegistry::new();
        let settings = Settings::default();
        let store = InMemoryStore::new();
        let ctx = InitCtx {
            settings: &settings,
            store: &store,
        };

        let core = Arc::new(TestModule::new("auth"));
        let custom = Arc::new(TestModule::new("blogs"));
        registry.register_core(core.clone());
        registry.register_custom(custom.clone());

        registry.bootstrap(&ctx).await.unwrap();
        registry.shutdown().await.unwrap();

        assert_eq!(core.inits.load(Ordering::SeqCst), 1);
        assert_eq!(custom.inits.load(Ordering::SeqCst), 1);
        assert!(registry.get_module("blogs").is_some());
    }
}
