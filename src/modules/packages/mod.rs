pub mod generator;
pub mod models;
mod routes;

use async_trait::async_trait;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tripdesk_db::CollectionSpec;
use tripdesk_kernel::{InitCtx, Module};

use crate::context::AppContext;
use crate::import::{ImportReport, ImportSummary};
use crate::utils::openapi::{ApiDoc, Body};
use models::{GenerateRequest, GenerateResponse, JsonImportRequest, Package};

/// Workbooks above this size are refused.
const MAX_WORKBOOK_BYTES: usize = 16 * 1024 * 1024;

/// Package catalogue, generation and bulk import
pub struct PackagesModule {
    ctx: AppContext,
}

impl PackagesModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for PackagesModule {
    fn name(&self) -> &'static str {
        "packages"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            completer = self.ctx.completer.name(),
            environment = ?ctx.settings.environment,
            "packages module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let imports = Router::new()
            .route("/import/preview", post(routes::preview_import))
            .route("/import", post(routes::commit_import))
            .layer(DefaultBodyLimit::max(MAX_WORKBOOK_BYTES));

        Router::new()
            .route("/", get(routes::list_packages).post(routes::create_package))
            .route(
                "/{id}",
                get(routes::get_package)
                    .put(routes::update_package)
                    .delete(routes::delete_package),
            )
            .route("/generate", post(routes::generate_packages))
            .route("/import/json/preview", post(routes::preview_json_import))
            .route("/import/json", post(routes::commit_json_import))
            .merge(imports)
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Packages")
                .schema::<Package>()
                .schema::<GenerateRequest>()
                .schema::<GenerateResponse>()
                .schema::<JsonImportRequest>()
                .schema::<ImportSummary>()
                .schema::<ImportReport>()
                .public("get", "/", "List packages (published only for the public)", Body::Empty, Body::Paged("Package"))
                .public("get", "/{id}", "Get a package by id or slug", Body::Empty, Body::Json("Package"))
                .secured("post", "/", "Create package", Body::Json("Package"), Body::Json("Package"))
                .secured("put", "/{id}", "Replace package", Body::Json("Package"), Body::Json("Package"))
                .secured("delete", "/{id}", "Delete package", Body::Empty, Body::Empty)
                .secured(
                    "post",
                    "/generate",
                    "Complete package skeletons without saving them",
                    Body::Json("GenerateRequest"),
                    Body::Json("GenerateResponse"),
                )
                .secured(
                    "post",
                    "/import/preview",
                    "Reconcile a workbook against stored packages",
                    Body::Raw("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
                    Body::Json("ImportSummary"),
                )
                .secured(
                    "post",
                    "/import",
                    "Import the new packages of a workbook",
                    Body::Raw("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
                    Body::Json("ImportReport"),
                )
                .secured(
                    "post",
                    "/import/json/preview",
                    "Reconcile a package list against stored packages",
                    Body::Json("JsonImportRequest"),
                    Body::Json("ImportSummary"),
                )
                .secured(
                    "post",
                    "/import/json",
                    "Import the new packages of a package list",
                    Body::Json("JsonImportRequest"),
                    Body::Json("ImportReport"),
                )
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new(
            "packages",
            &["destination_id", "slug", "published"],
        )]
    }
}

/// Create a new instance of the packages module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(PackagesModule::new(ctx.clone()))
}
