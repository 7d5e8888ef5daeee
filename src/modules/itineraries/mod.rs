//! Customer itineraries.
//!
//! `balance_due` is derived from `total_cost - advance_paid` on every write and
//! `history` only ever grows: client-supplied values for either are replaced.

pub mod models;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tripdesk_authz::{AuthUser, Claims, Permission};
use tripdesk_db::{new_id, CollectionSpec, Repository, StoreError};
use tripdesk_http::AppError;
use tripdesk_kernel::{InitCtx, Module};
use validator::Validate;

use crate::context::AppContext;
use crate::modules::packages::models::Package;
use crate::pdf;
use crate::utils::listing::{self, ListQuery, Page};
use crate::utils::openapi::{ApiDoc, Body};
use crate::utils::text::normalize_email;
use models::{CustomerItinerary, NoteRequest};

pub struct ItinerariesModule {
    ctx: AppContext,
}

impl ItinerariesModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for ItinerariesModule {
    fn name(&self) -> &'static str {
        "itineraries"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "itineraries module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_itineraries).post(create_itinerary))
            .route(
                "/{id}",
                get(get_itinerary)
                    .put(update_itinerary)
                    .delete(delete_itinerary),
            )
            .route("/{id}/notes", post(add_note))
            .route("/{id}/pdf", get(download_pdf))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Itineraries")
                .schema::<CustomerItinerary>()
                .schema::<NoteRequest>()
                .secured("get", "/", "List itineraries", Body::Empty, Body::Paged("CustomerItinerary"))
                .secured("post", "/", "Create itinerary", Body::Json("CustomerItinerary"), Body::Json("CustomerItinerary"))
                .secured("get", "/{id}", "Get itinerary", Body::Empty, Body::Json("CustomerItinerary"))
                .secured("put", "/{id}", "Replace itinerary", Body::Json("CustomerItinerary"), Body::Json("CustomerItinerary"))
                .secured("delete", "/{id}", "Delete itinerary", Body::Empty, Body::Empty)
                .secured("post", "/{id}/notes", "Append a note", Body::Json("NoteRequest"), Body::Json("CustomerItinerary"))
                .secured("get", "/{id}/pdf", "Download as PDF", Body::Empty, Body::Raw("application/pdf"))
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new(
            "customer_itineraries",
            &["reference", "status", "customer_email"],
        )]
    }
}

/// `TD-YYYYMMDD-XXXXXX`
pub fn generate_reference() -> String {
    let id = new_id().replace('-', "");
    let suffix = &id[id.len().saturating_sub(6)..];
    format!("TD-{}-{}", Utc::now().format("%Y%m%d"), suffix.to_uppercase())
}

fn check(itinerary: &CustomerItinerary) -> Result<(), AppError> {
    itinerary.validate()?;
    if let (Some(start), Some(end)) = (itinerary.start_date, itinerary.end_date) {
        if end < start {
            return Err(AppError::invalid_field(
                "end_date",
                "before_start",
                "end_date must not be before start_date",
            ));
        }
    }
    if itinerary.advance_paid > itinerary.total_cost {
        return Err(AppError::invalid_field(
            "advance_paid",
            "exceeds_total",
            "advance_paid cannot exceed total_cost",
        ));
    }
    Ok(())
}

fn prepare(itinerary: &mut CustomerItinerary, settings_currency: &str) {
    itinerary.customer_email = normalize_email(&itinerary.customer_email);
    if itinerary.currency.trim().is_empty() {
        itinerary.currency = settings_currency.to_string();
    }
    itinerary.days.sort_by_key(|day| day.day);
    itinerary.recompute_balance();
}

fn actor(claims: &Claims) -> &str {
    &claims.email
}

async fn list_itineraries(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<CustomerItinerary>>, AppError> {
    claims.require(Permission::ManageItineraries)?;
    let itineraries = ctx.repo::<CustomerItinerary>().list().await?;
    Ok(Json(listing::apply(itineraries, &query)))
}

async fn get_itinerary(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CustomerItinerary>, AppError> {
    claims.require(Permission::ManageItineraries)?;
    Ok(Json(ctx.repo::<CustomerItinerary>().get(&id).await?))
}

async fn create_itinerary(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Json(mut body): Json<CustomerItinerary>,
) -> Result<(StatusCode, Json<CustomerItinerary>), AppError> {
    claims.require(Permission::ManageItineraries)?;
    check(&body)?;
    prepare(&mut body, &ctx.settings.generator.default_currency);

    let now = Utc::now();
    body.id = String::new();
    if body.reference.trim().is_empty() {
        body.reference = generate_reference();
    }
    body.history.clear();
    body.record(actor(&claims), "created", format!("status {}", body.status.as_str()));
    body.created_at = now;
    body.updated_at = now;

    let itinerary = ctx.repo::<CustomerItinerary>().create(body).await?;
    tracing::info!(
        itinerary = %itinerary.id,
        reference = %itinerary.reference,
        balance_due = itinerary.balance_due,
        "itinerary created"
    );
    Ok((StatusCode::CREATED, Json(itinerary)))
}

fn describe_changes(before: &CustomerItinerary, after: &CustomerItinerary) -> String {
    let mut changes = Vec::new();
    if before.status != after.status {
        changes.push(format!("status {} -> {}", before.status.as_str(), after.status.as_str()));
    }
    if before.total_cost != after.total_cost {
        changes.push(format!("total {:.2} -> {:.2}", before.total_cost, after.total_cost));
    }
    if before.advance_paid != after.advance_paid {
        changes.push(format!("advance {:.2} -> {:.2}", before.advance_paid, after.advance_paid));
    }
    if before.days.len() != after.days.len() {
        changes.push(format!("days {} -> {}", before.days.len(), after.days.len()));
    }
    if changes.is_empty() {
        "details edited".to_string()
    } else {
        changes.join("; ")
    }
}

async fn update_itinerary(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(mut body): Json<CustomerItinerary>,
) -> Result<Json<CustomerItinerary>, AppError> {
    claims.require(Permission::ManageItineraries)?;
    check(&body)?;
    prepare(&mut body, &ctx.settings.generator.default_currency);

    let repo: Repository<CustomerItinerary> = ctx.repo();
    let existing = repo.get(&id).await?;
    let detail = describe_changes(&existing, &body);

    body.id = existing.id;
    if body.reference.trim().is_empty() {
        body.reference = existing.reference;
    }
    body.history = existing.history;
    body.record(actor(&claims), "updated", detail);
    body.created_at = existing.created_at;
    body.updated_at = Utc::now();

    Ok(Json(repo.save(&body).await?))
}

async fn add_note(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<NoteRequest>,
) -> Result<Json<CustomerItinerary>, AppError> {
    claims.require(Permission::ManageItineraries)?;
    body.validate()?;

    let repo: Repository<CustomerItinerary> = ctx.repo();
    let mut itinerary = repo.get(&id).await?;
    let note = body.note.trim().to_string();
    if !itinerary.notes.is_empty() {
        itinerary.notes.push('\n');
    }
    itinerary.notes.push_str(&note);
    itinerary.record(actor(&claims), "note", note);
    itinerary.updated_at = Utc::now();
    Ok(Json(repo.save(&itinerary).await?))
}

async fn delete_itinerary(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require(Permission::ManageItineraries)?;
    ctx.repo::<CustomerItinerary>().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

async fn linked_package(ctx: &AppContext, itinerary: &CustomerItinerary) -> Result<Option<Package>, AppError> {
    let Some(package_id) = itinerary.package_id.as_deref().filter(|id| !id.is_empty()) else {
        return Ok(None);
    };
    match ctx.repo::<Package>().get(package_id).await {
        Ok(package) => Ok(Some(package)),
        Err(StoreError::NotFound { .. }) => {
            tracing::debug!(package = %package_id, "linked package no longer exists");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

async fn download_pdf(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Permission::ManageItineraries)?;
    let itinerary = ctx.repo::<CustomerItinerary>().get(&id).await?;
    let package = linked_package(&ctx, &itinerary).await?;

    let brand = ctx.settings.brand.clone();
    let file_name = pdf::file_name(&itinerary);
    let bytes = tokio::task::spawn_blocking(move || {
        pdf::itinerary_pdf(&itinerary, package.as_ref(), &brand)
    })
    .await
    .map_err(anyhow::Error::from)?
    .map_err(anyhow::Error::from)?;

    tracing::info!(itinerary = %id, bytes = bytes.len(), "itinerary pdf rendered");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    ))
}

/// Create a new instance of the itineraries module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ItinerariesModule::new(ctx.clone()))
}
