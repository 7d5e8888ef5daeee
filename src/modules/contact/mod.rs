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
use crate::utils::text::normalize_email;
use models::{ContactMessage, ContactRequest, MarkReadRequest, MessageStatus, MessageStatusRequest};

/// Contact form inbox
pub struct ContactModule {
    ctx: AppContext,
}

impl ContactModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for ContactModule {
    fn name(&self) -> &'static str {
        "contact"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "contact module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_messages).post(submit_message))
            .route("/{id}", get(get_message).delete(delete_message))
            .route("/{id}/read", post(mark_read))
            .route("/{id}/status", put(set_status))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Contact")
                .schema::<ContactMessage>()
                .schema::<ContactRequest>()
                .schema::<MarkReadRequest>()
                .schema::<MessageStatusRequest>()
                .public("post", "/", "Submit the contact form", Body::Json("ContactRequest"), Body::Json("ContactMessage"))
                .secured("get", "/", "List messages", Body::Empty, Body::Paged("ContactMessage"))
                .secured("get", "/{id}", "Get message", Body::Empty, Body::Json("ContactMessage"))
                .secured("delete", "/{id}", "Delete message", Body::Empty, Body::Empty)
                .secured("post", "/{id}/read", "Mark read or unread", Body::Json("MarkReadRequest"), Body::Json("ContactMessage"))
                .secured("put", "/{id}/status", "Set status", Body::Json("MessageStatusRequest"), Body::Json("ContactMessage"))
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new("contact_messages", &["status", "read"])]
    }
}

async fn submit_message(
    State(ctx): State<AppContext>,
    Json(body): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactMessage>), AppError> {
    body.validate()?;
    let now = Utc::now();
    let message = ctx
        .repo::<ContactMessage>()
        .create(ContactMessage {
            id: String::new(),
            name: body.name.trim().to_string(),
            email: normalize_email(&body.email),
            phone: body.phone.trim().to_string(),
            subject: body.subject.trim().to_string(),
            message: body.message,
            status: MessageStatus::New,
            read: false,
            created_at: now,
            updated_at: now,
        })
        .await?;
    tracing::info!(message = %message.id, "contact message received");
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_messages(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ContactMessage>>, AppError> {
    claims.require(Permission::ManageMessages)?;
    let messages = ctx.repo::<ContactMessage>().list().await?;
    Ok(Json(listing::apply(messages, &query)))
}

async fn get_message(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ContactMessage>, AppError> {
    claims.require(Permission::ManageMessages)?;
    Ok(Json(ctx.repo::<ContactMessage>().get(&id).await?))
}

async fn mark_read(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    body: Option<Json<MarkReadRequest>>,
) -> Result<Json<ContactMessage>, AppError> {
    claims.require(Permission::ManageMessages)?;
    let read = body.map_or(true, |Json(body)| body.read);

    let repo: Repository<ContactMessage> = ctx.repo();
    let mut message = repo.get(&id).await?;
    message.read = read;
    message.updated_at = Utc::now();
    Ok(Json(repo.save(&message).await?))
}

async fn set_status(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<MessageStatusRequest>,
) -> Result<Json<ContactMessage>, AppError> {
    claims.require(Permission::ManageMessages)?;
    let repo: Repository<ContactMessage> = ctx.repo();
    let mut message = repo.get(&id).await?;
    message.status = body.status;
    if body.status != MessageStatus::New {
        message.read = true;
    }
    message.updated_at = Utc::now();
    let message = repo.save(&message).await?;
    tracing::info!(message = %message.id, status = message.status.as_str(), "contact message status set");
    Ok(Json(message))
}

async fn delete_message(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require(Permission::ManageMessages)?;
    ctx.repo::<ContactMessage>().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Create a new instance of the contact module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ContactModule::new(ctx.clone()))
}
