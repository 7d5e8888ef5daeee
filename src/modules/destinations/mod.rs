pub mod models;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tripdesk_authz::{AuthUser, Permission};
use tripdesk_db::{CollectionSpec, Repository, StoreError};
use tripdesk_http::AppError;
use tripdesk_kernel::{InitCtx, Module};
use validator::Validate;

use crate::context::AppContext;
use crate::import::normalize_id;
use crate::utils::listing::{self, ListQuery, Page};
use crate::utils::openapi::{ApiDoc, Body};
use crate::utils::text::slugify;
use models::Destination;

pub struct DestinationsModule {
    ctx: AppContext,
}

impl DestinationsModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for DestinationsModule {
    fn name(&self) -> &'static str {
        "destinations"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "destinations module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_destinations).post(create_destination))
            .route(
                "/{id}",
                get(get_destination)
                    .put(update_destination)
                    .delete(delete_destination),
            )
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Destinations")
                .schema::<Destination>()
                .public("get", "/", "List destinations", Body::Empty, Body::Paged("Destination"))
                .public("get", "/{id}", "Get a destination by id, slug or code", Body::Empty, Body::Json("Destination"))
                .secured("post", "/", "Create destination", Body::Json("Destination"), Body::Json("Destination"))
                .secured("put", "/{id}", "Replace destination", Body::Json("Destination"), Body::Json("Destination"))
                .secured("delete", "/{id}", "Delete destination", Body::Empty, Body::Empty)
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new("destinations", &["code", "slug"])]
    }
}

fn prepare(destination: &mut Destination) {
    destination.code = normalize_id(&destination.code);
    destination.name = destination.name.trim().to_string();
    if destination.slug.trim().is_empty() {
        destination.slug = slugify(&destination.name);
    }
}

async fn ensure_unique_code(
    repo: &Repository<Destination>,
    code: &str,
    except: Option<&str>,
) -> Result<(), AppError> {
    let taken = repo
        .find_by("code", code)
        .await?
        .into_iter()
        .any(|other| Some(other.id.as_str()) != except);
    if taken {
        return Err(AppError::conflict(
            vec![serde_json::json!({"field": "code", "error": "taken"})],
            format!("destination code `{code}` already exists"),
        ));
    }
    Ok(())
}

async fn list_destinations(
    State(ctx): State<AppContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Destination>>, AppError> {
    let destinations = ctx.repo::<Destination>().list().await?;
    Ok(Json(listing::apply(destinations, &query)))
}

async fn get_destination(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<Destination>, AppError> {
    let repo: Repository<Destination> = ctx.repo();
    match repo.get(&key).await {
        Ok(destination) => return Ok(Json(destination)),
        Err(StoreError::NotFound { .. }) => {}
        Err(err) => return Err(err.into()),
    }

    let by_slug = repo.find_by("slug", &key).await?.into_iter().next();
    let found = match by_slug {
        Some(destination) => Some(destination),
        None => repo.find_by("code", normalize_id(&key)).await?.into_iter().next(),
    };
    found
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("destination `{key}` not found")))
}

async fn create_destination(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Json(mut body): Json<Destination>,
) -> Result<(StatusCode, Json<Destination>), AppError> {
    claims.require(Permission::ManageDestinations)?;
    body.validate()?;
    prepare(&mut body);

    let repo: Repository<Destination> = ctx.repo();
    ensure_unique_code(&repo, &body.code, None).await?;

    let now = Utc::now();
    body.id = String::new();
    body.created_at = now;
    body.updated_at = now;
    let destination = repo.create(body).await?;
    tracing::info!(destination = %destination.id, code = %destination.code, "destination created");
    Ok((StatusCode::CREATED, Json(destination)))
}

async fn update_destination(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(mut body): Json<Destination>,
) -> Result<Json<Destination>, AppError> {
    claims.require(Permission::ManageDestinations)?;
    body.validate()?;
    prepare(&mut body);

    let repo: Repository<Destination> = ctx.repo();
    let existing = repo.get(&id).await?;
    ensure_unique_code(&repo, &body.code, Some(&existing.id)).await?;

    body.id = existing.id;
    body.created_at = existing.created_at;
    body.updated_at = Utc::now();
    Ok(Json(repo.save(&body).await?))
}

async fn delete_destination(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require(Permission::ManageDestinations)?;
    ctx.repo::<Destination>().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Create a new instance of the destinations module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(DestinationsModule::new(ctx.clone()))
}
