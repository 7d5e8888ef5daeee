pub mod models;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use tripdesk_authz::{AuthUser, Permission};
use tripdesk_db::{CollectionSpec, Repository};
use tripdesk_http::AppError;
use tripdesk_kernel::{InitCtx, Module};
use validator::Validate;

use crate::context::AppContext;
use crate::utils::listing::{self, ListQuery, Page};
use crate::utils::openapi::{ApiDoc, Body};
use models::{ApproveRequest, SubmitTestimonialRequest, Testimonial};

/// Customer testimonials with moderation
pub struct TestimonialsModule {
    ctx: AppContext,
}

impl TestimonialsModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for TestimonialsModule {
    fn name(&self) -> &'static str {
        "testimonials"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "testimonials module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_approved).post(submit_testimonial))
            .route("/all", get(list_all))
            .route("/{id}", put(update_testimonial).delete(delete_testimonial))
            .route("/{id}/approve", post(approve_testimonial))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Testimonials")
                .schema::<Testimonial>()
                .schema::<SubmitTestimonialRequest>()
                .schema::<ApproveRequest>()
                .public("get", "/", "List approved testimonials", Body::Empty, Body::Paged("Testimonial"))
                .public(
                    "post",
                    "/",
                    "Submit a testimonial for moderation",
                    Body::Json("SubmitTestimonialRequest"),
                    Body::Json("Testimonial"),
                )
                .secured("get", "/all", "List every testimonial", Body::Empty, Body::Paged("Testimonial"))
                .secured("put", "/{id}", "Replace testimonial", Body::Json("Testimonial"), Body::Json("Testimonial"))
                .secured("post", "/{id}/approve", "Approve or withdraw", Body::Json("ApproveRequest"), Body::Json("Testimonial"))
                .secured("delete", "/{id}", "Delete testimonial", Body::Empty, Body::Empty)
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new("testimonials", &["approved", "featured"])]
    }
}

async fn list_approved(
    State(ctx): State<AppContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Testimonial>>, AppError> {
    let approved = ctx
        .repo::<Testimonial>()
        .list()
        .await?
        .into_iter()
        .filter(|testimonial| testimonial.approved)
        .collect();
    Ok(Json(listing::apply(approved, &query)))
}

async fn list_all(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Testimonial>>, AppError> {
    claims.require(Permission::ManageTestimonials)?;
    let testimonials = ctx.repo::<Testimonial>().list().await?;
    Ok(Json(listing::apply(testimonials, &query)))
}

async fn submit_testimonial(
    State(ctx): State<AppContext>,
    Json(body): Json<SubmitTestimonialRequest>,
) -> Result<(StatusCode, Json<Testimonial>), AppError> {
    body.validate()?;
    let now = Utc::now();
    let testimonial = ctx
        .repo::<Testimonial>()
        .create(Testimonial {
            id: String::new(),
            name: body.name.trim().to_string(),
            location: body.location.trim().to_string(),
            rating: body.rating,
            message: body.message.trim().to_string(),
            trip: body.trip.trim().to_string(),
            image_url: body.image_url,
            approved: false,
            featured: false,
            created_at: now,
            updated_at: now,
        })
        .await?;
    tracing::info!(testimonial = %testimonial.id, "testimonial submitted for moderation");
    Ok((StatusCode::CREATED, Json(testimonial)))
}

async fn update_testimonial(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(mut body): Json<Testimonial>,
) -> Result<Json<Testimonial>, AppError> {
    claims.require(Permission::ManageTestimonials)?;
    body.validate()?;

    let repo: Repository<Testimonial> = ctx.repo();
    let existing = repo.get(&id).await?;
    body.id = existing.id;
    body.created_at = existing.created_at;
    body.updated_at = Utc::now();
    Ok(Json(repo.save(&body).await?))
}

async fn approve_testimonial(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<Testimonial>, AppError> {
    claims.require(Permission::ManageTestimonials)?;
    let approved = body.map_or(true, |Json(body)| body.approved);

    let repo: Repository<Testimonial> = ctx.repo();
    let mut testimonial = repo.get(&id).await?;
    testimonial.approved = approved;
    if !approved {
        testimonial.featured = false;
    }
    testimonial.updated_at = Utc::now();
    let testimonial = repo.save(&testimonial).await?;
    tracing::info!(testimonial = %testimonial.id, approved, "testimonial moderated");
    Ok(Json(testimonial))
}

async fn delete_testimonial(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require(Permission::ManageTestimonials)?;
    ctx.repo::<Testimonial>().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Create a new instance of the testimonials module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(TestimonialsModule::new(ctx.clone()))
}
