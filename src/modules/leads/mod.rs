//! Inquiries from the website, the tailored-travel wizard and the contact form.

pub mod models;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tripdesk_authz::{AuthUser, Permission};
use tripdesk_db::{CollectionSpec, Repository, StoreResult};
use tripdesk_http::AppError;
use tripdesk_kernel::{InitCtx, Module};
use validator::Validate;

use crate::context::AppContext;
use crate::utils::listing::{self, ListQuery, Page};
use crate::utils::openapi::{ApiDoc, Body};
use crate::utils::text::normalize_email;
use models::{CreateLeadRequest, Lead, LeadSource, LeadStatus};

pub struct LeadsModule {
    ctx: AppContext,
}

impl LeadsModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for LeadsModule {
    fn name(&self) -> &'static str {
        "leads"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "leads module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_leads).post(create_lead))
            .route("/{id}", get(get_lead).put(update_lead).delete(delete_lead))
            .route("/{id}/cycle-status", post(cycle_status))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Leads")
                .schema::<Lead>()
                .schema::<CreateLeadRequest>()
                .public("post", "/", "Submit an inquiry", Body::Json("CreateLeadRequest"), Body::Json("Lead"))
                .secured("get", "/", "List leads", Body::Empty, Body::Paged("Lead"))
                .secured("get", "/{id}", "Get lead", Body::Empty, Body::Json("Lead"))
                .secured("put", "/{id}", "Replace lead", Body::Json("Lead"), Body::Json("Lead"))
                .secured("delete", "/{id}", "Delete lead", Body::Empty, Body::Empty)
                .secured(
                    "post",
                    "/{id}/cycle-status",
                    "Advance status new → contacted → converted → new",
                    Body::Empty,
                    Body::Json("Lead"),
                )
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new("leads", &["status", "source", "email"])]
    }
}

/// Store a new lead with status `new`.
pub async fn record_lead(repo: &Repository<Lead>, request: CreateLeadRequest, source: LeadSource) -> StoreResult<Lead> {
    let now = Utc::now();
    let lead = repo
        .create(Lead {
            id: String::new(),
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
            phone: request.phone.trim().to_string(),
            destination: request.destination.trim().to_string(),
            travel_date: request.travel_date,
            travelers: request.travelers,
            budget: request.budget,
            message: request.message,
            source,
            status: LeadStatus::New,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    tracing::info!(lead = %lead.id, source = lead.source.as_str(), "lead recorded");
    Ok(lead)
}

async fn create_lead(
    State(ctx): State<AppContext>,
    Json(body): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    body.validate()?;
    let source = match body.source {
        Some(LeadSource::Manual) | None => LeadSource::Website,
        Some(source) => source,
    };
    let lead = record_lead(&ctx.repo(), body, source).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

async fn list_leads(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Lead>>, AppError> {
    claims.require(Permission::ManageLeads)?;
    let leads = ctx.repo::<Lead>().list().await?;
    Ok(Json(listing::apply(leads, &query)))
}

async fn get_lead(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Lead>, AppError> {
    claims.require(Permission::ManageLeads)?;
    Ok(Json(ctx.repo::<Lead>().get(&id).await?))
}

async fn update_lead(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(mut body): Json<Lead>,
) -> Result<Json<Lead>, AppError> {
    claims.require(Permission::ManageLeads)?;
    body.validate()?;

    let repo: Repository<Lead> = ctx.repo();
    let existing = repo.get(&id).await?;
    body.id = existing.id;
    body.email = normalize_email(&body.email);
    body.created_at = existing.created_at;
    body.updated_at = Utc::now();
    Ok(Json(repo.save(&body).await?))
}

async fn cycle_status(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Lead>, AppError> {
    claims.require(Permission::ManageLeads)?;
    let repo: Repository<Lead> = ctx.repo();
    let mut lead = repo.get(&id).await?;
    let previous = lead.status;
    lead.status = previous.next();
    lead.updated_at = Utc::now();
    let lead = repo.save(&lead).await?;
    tracing::info!(
        lead = %lead.id,
        from = previous.as_str(),
        to = lead.status.as_str(),
        "lead status cycled"
    );
    Ok(Json(lead))
}

async fn delete_lead(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require(Permission::ManageLeads)?;
    ctx.repo::<Lead>().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Create a new instance of the leads module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(LeadsModule::new(ctx.clone()))
}
