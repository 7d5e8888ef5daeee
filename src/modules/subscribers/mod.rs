pub mod models;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
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
use models::{to_csv, SubscribeRequest, Subscriber, UnsubscribeRequest};

/// Newsletter list
pub struct SubscribersModule {
    ctx: AppContext,
}

impl SubscribersModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for SubscribersModule {
    fn name(&self) -> &'static str {
        "subscribers"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "subscribers module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_subscribers))
            .route("/subscribe", post(subscribe))
            .route("/unsubscribe", post(unsubscribe))
            .route("/export", get(export_csv))
            .route("/{id}", delete(delete_subscriber))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Subscribers")
                .schema::<Subscriber>()
                .schema::<SubscribeRequest>()
                .schema::<UnsubscribeRequest>()
                .public("post", "/subscribe", "Subscribe to the newsletter", Body::Json("SubscribeRequest"), Body::Json("Subscriber"))
                .public("post", "/unsubscribe", "Unsubscribe", Body::Json("UnsubscribeRequest"), Body::Json("Subscriber"))
                .secured("get", "/", "List subscribers", Body::Empty, Body::Paged("Subscriber"))
                .secured("get", "/export", "Export subscribers as CSV", Body::Empty, Body::Raw("text/csv"))
                .secured("delete", "/{id}", "Delete subscriber", Body::Empty, Body::Empty)
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new("newsletter_subscribers", &["email", "active"])]
    }
}

async fn find_by_email(repo: &Repository<Subscriber>, email: &str) -> Result<Option<Subscriber>, AppError> {
    Ok(repo.find_by("email", email).await?.into_iter().next())
}

/// Idempotent: an active address is returned as is, an inactive one is
/// reactivated.
async fn subscribe(
    State(ctx): State<AppContext>,
    Json(body): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Subscriber>), AppError> {
    body.validate()?;
    let repo: Repository<Subscriber> = ctx.repo();
    let email = normalize_email(&body.email);
    let now = Utc::now();

    match find_by_email(&repo, &email).await? {
        Some(existing) if existing.active => Ok((StatusCode::OK, Json(existing))),
        Some(mut existing) => {
            existing.active = true;
            existing.subscribed_at = now;
            existing.unsubscribed_at = None;
            existing.updated_at = now;
            let subscriber = repo.save(&existing).await?;
            tracing::info!(subscriber = %subscriber.id, "subscriber reactivated");
            Ok((StatusCode::OK, Json(subscriber)))
        }
        None => {
            let subscriber = repo
                .create(Subscriber {
                    id: String::new(),
                    email,
                    source: body
                        .source
                        .map(|source| source.trim().to_string())
                        .filter(|source| !source.is_empty())
                        .unwrap_or_else(|| "website".to_string()),
                    active: true,
                    subscribed_at: now,
                    unsubscribed_at: None,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
            tracing::info!(subscriber = %subscriber.id, "subscriber added");
            Ok((StatusCode::CREATED, Json(subscriber)))
        }
    }
}

async fn unsubscribe(
    State(ctx): State<AppContext>,
    Json(body): Json<UnsubscribeRequest>,
) -> Result<Json<Subscriber>, AppError> {
    body.validate()?;
    let repo: Repository<Subscriber> = ctx.repo();
    let email = normalize_email(&body.email);
    let mut subscriber = find_by_email(&repo, &email)
        .await?
        .ok_or_else(|| AppError::not_found("this address is not subscribed"))?;

    if subscriber.active {
        let now = Utc::now();
        subscriber.active = false;
        subscriber.unsubscribed_at = Some(now);
        subscriber.updated_at = now;
        subscriber = repo.save(&subscriber).await?;
        tracing::info!(subscriber = %subscriber.id, "subscriber left");
    }
    Ok(Json(subscriber))
}

async fn list_subscribers(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Subscriber>>, AppError> {
    claims.require(Permission::ManageSubscribers)?;
    let subscribers = ctx.repo::<Subscriber>().list().await?;
    Ok(Json(listing::apply(subscribers, &query)))
}

/// Honours the list filters but not paging.
async fn export_csv(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Permission::ManageSubscribers)?;
    let subscribers = ctx.repo::<Subscriber>().list().await?;
    let total = subscribers.len();
    let selected = listing::select(subscribers, &query);

    tracing::info!(exported = selected.len(), total, "subscribers exported");
    let file_name = format!("subscribers-{}.csv", Utc::now().format("%Y%m%d"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        to_csv(&selected),
    ))
}

async fn delete_subscriber(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require(Permission::ManageSubscribers)?;
    ctx.repo::<Subscriber>().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Create a new instance of the subscribers module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(SubscribersModule::new(ctx.clone()))
}
