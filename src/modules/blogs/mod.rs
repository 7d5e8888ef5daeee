pub mod models;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tripdesk_authz::{AuthUser, MaybeAuthUser, Permission};
use tripdesk_db::{CollectionSpec, Repository, StoreError};
use tripdesk_http::AppError;
use tripdesk_kernel::{InitCtx, Module};
use validator::Validate;

use crate::context::AppContext;
use crate::utils::listing::{self, ListQuery, Page};
use crate::utils::openapi::{ApiDoc, Body};
use crate::utils::text::{slugify, truncate_words};
use models::{read_time_minutes, BlogPost, Counters, PublishRequest};

const EXCERPT_LEN: usize = 180;

/// Travel blog
pub struct BlogsModule {
    ctx: AppContext,
}

impl BlogsModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for BlogsModule {
    fn name(&self) -> &'static str {
        "blogs"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "blogs module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_posts).post(create_post))
            .route("/{id}", get(get_post).put(update_post).delete(delete_post))
            .route("/{id}/publish", post(publish_post))
            .route("/{id}/like", post(like_post))
            .route("/{id}/view", post(view_post))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Blogs")
                .schema::<BlogPost>()
                .schema::<PublishRequest>()
                .schema::<Counters>()
                .public("get", "/", "List posts (published only for the public)", Body::Empty, Body::Paged("BlogPost"))
                .public("get", "/{id}", "Get a post by id or slug", Body::Empty, Body::Json("BlogPost"))
                .secured("post", "/", "Create post", Body::Json("BlogPost"), Body::Json("BlogPost"))
                .secured("put", "/{id}", "Replace post", Body::Json("BlogPost"), Body::Json("BlogPost"))
                .secured("delete", "/{id}", "Delete post", Body::Empty, Body::Empty)
                .secured("post", "/{id}/publish", "Publish or unpublish", Body::Json("PublishRequest"), Body::Json("BlogPost"))
                .public("post", "/{id}/like", "Like a post", Body::Empty, Body::Json("Counters"))
                .public("post", "/{id}/view", "Count a view", Body::Empty, Body::Json("Counters"))
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new("blogs", &["slug", "published", "category"])]
    }
}

/// Resolve a path key as an id, falling back to a slug.
async fn find_post(repo: &Repository<BlogPost>, key: &str) -> Result<BlogPost, AppError> {
    match repo.get(key).await {
        Ok(post) => Ok(post),
        Err(StoreError::NotFound { .. }) => repo
            .find_by("slug", key)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("blog post `{key}` not found"))),
        Err(err) => Err(err.into()),
    }
}

fn prepare(post: &mut BlogPost) {
    post.title = post.title.trim().to_string();
    if post.slug.trim().is_empty() {
        post.slug = slugify(&post.title);
    }
    if post.excerpt.trim().is_empty() {
        post.excerpt = truncate_words(&post.content, EXCERPT_LEN);
    }
    post.read_time_minutes = read_time_minutes(&post.content);
}

async fn list_posts(
    State(ctx): State<AppContext>,
    MaybeAuthUser(claims): MaybeAuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<BlogPost>>, AppError> {
    let show_drafts = claims.is_some_and(|claims| claims.can(Permission::ManageBlogs));
    let posts = ctx
        .repo::<BlogPost>()
        .list()
        .await?
        .into_iter()
        .filter(|post| show_drafts || post.published)
        .collect();
    Ok(Json(listing::apply(posts, &query)))
}

async fn get_post(
    State(ctx): State<AppContext>,
    MaybeAuthUser(claims): MaybeAuthUser,
    Path(key): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    let post = find_post(&ctx.repo(), &key).await?;
    let show_drafts = claims.is_some_and(|claims| claims.can(Permission::ManageBlogs));
    if !post.published && !show_drafts {
        return Err(AppError::not_found(format!("blog post `{key}` not found")));
    }
    Ok(Json(post))
}

async fn create_post(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Json(mut body): Json<BlogPost>,
) -> Result<(StatusCode, Json<BlogPost>), AppError> {
    claims.require(Permission::ManageBlogs)?;
    body.validate()?;
    prepare(&mut body);

    let repo: Repository<BlogPost> = ctx.repo();
    if !repo.find_by("slug", &body.slug).await?.is_empty() {
        return Err(AppError::conflict(
            vec![serde_json::json!({"field": "slug", "error": "taken"})],
            "a post with this slug already exists",
        ));
    }

    let now = Utc::now();
    let published = body.published;
    body.id = String::new();
    body.published = false;
    body.published_at = None;
    body.set_published(published);
    body.likes = 0;
    body.views = 0;
    body.comments = 0;
    body.created_at = now;
    body.updated_at = now;
    if body.author.trim().is_empty() {
        body.author = claims.email.clone();
    }

    let post = repo.create(body).await?;
    tracing::info!(post = %post.id, slug = %post.slug, published = post.published, "blog post created");
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(mut body): Json<BlogPost>,
) -> Result<Json<BlogPost>, AppError> {
    claims.require(Permission::ManageBlogs)?;
    body.validate()?;
    prepare(&mut body);

    let repo: Repository<BlogPost> = ctx.repo();
    let existing = repo.get(&id).await?;
    let clash = repo
        .find_by("slug", &body.slug)
        .await?
        .into_iter()
        .any(|other| other.id != existing.id);
    if clash {
        return Err(AppError::conflict(
            vec![serde_json::json!({"field": "slug", "error": "taken"})],
            "a post with this slug already exists",
        ));
    }

    let published = body.published;
    body.id = existing.id;
    body.published = existing.published;
    body.published_at = existing.published_at;
    body.set_published(published);
    body.likes = existing.likes;
    body.views = existing.views;
    body.comments = existing.comments;
    body.created_at = existing.created_at;
    body.updated_at = Utc::now();
    Ok(Json(repo.save(&body).await?))
}

async fn delete_post(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require(Permission::ManageBlogs)?;
    ctx.repo::<BlogPost>().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

async fn publish_post(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<PublishRequest>,
) -> Result<Json<BlogPost>, AppError> {
    claims.require(Permission::ManageBlogs)?;
    let repo: Repository<BlogPost> = ctx.repo();
    let mut post = repo.get(&id).await?;
    post.set_published(body.published);
    post.updated_at = Utc::now();
    let post = repo.save(&post).await?;
    tracing::info!(post = %post.id, published = post.published, "blog publish state changed");
    Ok(Json(post))
}

/// Read-modify-write; concurrent bumps may be lost.
async fn bump(ctx: &AppContext, key: &str, apply: fn(&mut BlogPost)) -> Result<Counters, AppError> {
    let repo: Repository<BlogPost> = ctx.repo();
    let mut post = find_post(&repo, key).await?;
    if !post.published {
        return Err(AppError::not_found(format!("blog post `{key}` not found")));
    }
    apply(&mut post);
    let post = repo.save(&post).await?;
    Ok(Counters {
        likes: post.likes,
        views: post.views,
    })
}

async fn like_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Counters>, AppError> {
    Ok(Json(bump(&ctx, &id, |post| post.likes += 1).await?))
}

async fn view_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Counters>, AppError> {
    Ok(Json(bump(&ctx, &id, |post| post.views += 1).await?))
}

/// Create a new instance of the blogs module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BlogsModule::new(ctx.clone()))
}
