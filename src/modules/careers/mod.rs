pub mod models;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
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
use crate::utils::text::normalize_email;
use models::{ApplicationStatus, ApplicationStatusRequest, ApplyRequest, JobApplication};

/// Job applications from the careers page
pub struct CareersModule {
    ctx: AppContext,
}

impl CareersModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for CareersModule {
    fn name(&self) -> &'static str {
        "careers"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "careers module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_applications).post(apply))
            .route("/{id}", get(get_application).delete(delete_application))
            .route("/{id}/status", put(set_status))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Careers")
                .schema::<JobApplication>()
                .schema::<ApplyRequest>()
                .schema::<ApplicationStatusRequest>()
                .public("post", "/", "Apply for a position", Body::Json("ApplyRequest"), Body::Json("JobApplication"))
                .secured("get", "/", "List applications", Body::Empty, Body::Paged("JobApplication"))
                .secured("get", "/{id}", "Get application", Body::Empty, Body::Json("JobApplication"))
                .secured(
                    "put",
                    "/{id}/status",
                    "Move an application through review",
                    Body::Json("ApplicationStatusRequest"),
                    Body::Json("JobApplication"),
                )
                .secured("delete", "/{id}", "Delete application", Body::Empty, Body::Empty)
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new("job_applications", &["status", "position"])]
    }
}

async fn apply(
    State(ctx): State<AppContext>,
    Json(body): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<JobApplication>), AppError> {
    body.validate()?;
    let now = Utc::now();
    let application = ctx
        .repo::<JobApplication>()
        .create(JobApplication {
            id: String::new(),
            name: body.name.trim().to_string(),
            email: normalize_email(&body.email),
            phone: body.phone.trim().to_string(),
            position: body.position.trim().to_string(),
            experience_years: body.experience_years,
            resume_url: body.resume_url.trim().to_string(),
            cover_letter: body.cover_letter,
            status: ApplicationStatus::New,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    tracing::info!(application = %application.id, position = %application.position, "job application received");
    Ok((StatusCode::CREATED, Json(application)))
}

async fn list_applications(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<JobApplication>>, AppError> {
    claims.require(Permission::ManageApplications)?;
    let applications = ctx.repo::<JobApplication>().list().await?;
    Ok(Json(listing::apply(applications, &query)))
}

async fn get_application(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<JobApplication>, AppError> {
    claims.require(Permission::ManageApplications)?;
    Ok(Json(ctx.repo::<JobApplication>().get(&id).await?))
}

async fn set_status(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ApplicationStatusRequest>,
) -> Result<Json<JobApplication>, AppError> {
    claims.require(Permission::ManageApplications)?;
    let repo: Repository<JobApplication> = ctx.repo();
    let mut application = repo.get(&id).await?;
    application.status = body.status;
    if let Some(notes) = body.notes {
        application.notes = notes;
    }
    application.updated_at = Utc::now();
    let application = repo.save(&application).await?;
    tracing::info!(application = %application.id, status = application.status.as_str(), "application status set");
    Ok(Json(application))
}

async fn delete_application(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require(Permission::ManageApplications)?;
    ctx.repo::<JobApplication>().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Create a new instance of the careers module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(CareersModule::new(ctx.clone()))
}
