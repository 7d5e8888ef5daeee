//! Registration, login and the current-user endpoint.
//!
//! Tokens snapshot the account's role and permissions; see `tripdesk_authz`.

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tripdesk_authz::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use tripdesk_authz::{AuthUser, IssuedToken, Role};
use tripdesk_db::Repository;
use tripdesk_http::AppError;
use tripdesk_kernel::{InitCtx, Module};
use utoipa::ToSchema;
use validator::Validate;

use crate::context::AppContext;
use crate::modules::users::models::{User, UserView};
use crate::utils::openapi::{ApiDoc, Body};
use crate::utils::text::normalize_email;

pub struct AuthModule {
    ctx: AppContext,
}

impl AuthModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 120))]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: IssuedToken,
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let auth = &ctx.settings.auth;
        if let (Some(email), Some(password)) =
            (&auth.bootstrap_admin_email, &auth.bootstrap_admin_password)
        {
            seed_admin(&self.ctx.repo(), email, password).await?;
        }
        tracing::info!(module = self.name(), "auth module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/me", get(me))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Auth")
                .schema::<RegisterRequest>()
                .schema::<LoginRequest>()
                .schema::<AuthResponse>()
                .public(
                    "post",
                    "/register",
                    "Create an account",
                    Body::Json("RegisterRequest"),
                    Body::Json("AuthResponse"),
                )
                .public(
                    "post",
                    "/login",
                    "Exchange credentials for a token",
                    Body::Json("LoginRequest"),
                    Body::Json("AuthResponse"),
                )
                .secured("get", "/me", "Current account", Body::Empty, Body::Json("UserView"))
                .build(),
        )
    }
}

/// Create the configured admin account unless that email is already taken.
pub async fn seed_admin(repo: &Repository<User>, email: &str, password: &str) -> anyhow::Result<()> {
    let email = normalize_email(email);
    if !repo.find_by("email", &email).await?.is_empty() {
        tracing::debug!(%email, "bootstrap admin already present");
        return Ok(());
    }
    if password.len() < MIN_PASSWORD_LEN {
        anyhow::bail!("bootstrap admin password must be at least {MIN_PASSWORD_LEN} characters");
    }

    let now = Utc::now();
    repo.create(User {
        id: String::new(),
        email: email.clone(),
        display_name: "Administrator".to_string(),
        role: Role::Admin,
        permissions: vec![],
        active: true,
        password_hash: hash_password(password)?,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    })
    .await?;
    tracing::info!(%email, "bootstrap admin created");
    Ok(())
}

async fn register(
    State(ctx): State<AppContext>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    body.validate()?;
    let repo: Repository<User> = ctx.repo();
    let email = normalize_email(&body.email);

    if !repo.find_by("email", &email).await?.is_empty() {
        return Err(AppError::conflict(
            vec![serde_json::json!({"field": "email", "error": "taken"})],
            "an account with this email already exists",
        ));
    }

    let now = Utc::now();
    let user = repo
        .create(User {
            id: String::new(),
            email,
            display_name: body.display_name.trim().to_string(),
            role: Role::User,
            permissions: vec![],
            active: true,
            password_hash: hash_password(&body.password).map_err(anyhow::Error::from)?,
            last_login_at: Some(now),
            created_at: now,
            updated_at: now,
        })
        .await?;

    let token = ctx
        .tokens
        .issue(&user.id, &user.email, user.role, &user.permissions)
        .map_err(anyhow::Error::from)?;
    tracing::info!(user = %user.id, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserView::from(&user),
            token,
        }),
    ))
}

async fn login(
    State(ctx): State<AppContext>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    body.validate()?;
    let repo: Repository<User> = ctx.repo();
    let email = normalize_email(&body.email);

    let mut user = repo
        .find_by("email", &email)
        .await?
        .into_iter()
        .next()
        .filter(|user| verify_password(&body.password, &user.password_hash))
        .ok_or_else(|| AppError::unauthorized("invalid email or password"))?;

    if !user.active {
        return Err(AppError::forbidden("this account has been deactivated"));
    }

    user.last_login_at = Some(Utc::now());
    let user = repo.save(&user).await?;

    let token = ctx
        .tokens
        .issue(&user.id, &user.email, user.role, &user.permissions)
        .map_err(anyhow::Error::from)?;
    tracing::info!(user = %user.id, role = user.role.as_str(), "login succeeded");

    Ok(Json(AuthResponse {
        user: UserView::from(&user),
        token,
    }))
}

async fn me(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserView>, AppError> {
    let user = ctx.repo::<User>().get(&claims.sub).await?;
    Ok(Json(UserView::from(&user)))
}

/// Create a new instance of the auth module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthModule::new(ctx.clone()))
}
