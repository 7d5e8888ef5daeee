pub mod models;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tripdesk_authz::{AuthUser, Permission};
use tripdesk_db::{CollectionSpec, Repository};
use tripdesk_http::AppError;
use tripdesk_kernel::{InitCtx, Module};

use crate::context::AppContext;
use crate::utils::listing::{self, ListQuery, Page};
use crate::utils::openapi::{ApiDoc, Body};
use models::{ChangeRoleRequest, UpdatePermissionsRequest, User, UserView};

/// Dashboard user administration
pub struct UsersModule {
    ctx: AppContext,
}

impl UsersModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_users))
            .route("/{id}", get(get_user).delete(delete_user))
            .route("/{id}/role", put(change_role))
            .route("/{id}/permissions", put(update_permissions))
            .route("/{id}/toggle-active", post(toggle_active))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Users")
                .schema::<UserView>()
                .schema::<ChangeRoleRequest>()
                .schema::<UpdatePermissionsRequest>()
                .secured("get", "/", "List users", Body::Empty, Body::Paged("UserView"))
                .secured("get", "/{id}", "Get user", Body::Empty, Body::Json("UserView"))
                .secured("delete", "/{id}", "Delete user", Body::Empty, Body::Empty)
                .secured(
                    "put",
                    "/{id}/role",
                    "Change role (requires confirm: true)",
                    Body::Json("ChangeRoleRequest"),
                    Body::Json("UserView"),
                )
                .secured(
                    "put",
                    "/{id}/permissions",
                    "Replace permissions",
                    Body::Json("UpdatePermissionsRequest"),
                    Body::Json("UserView"),
                )
                .secured(
                    "post",
                    "/{id}/toggle-active",
                    "Activate or deactivate",
                    Body::Empty,
                    Body::Json("UserView"),
                )
                .build(),
        )
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new("users", &["email", "role"])]
    }
}

async fn list_users(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<UserView>>, AppError> {
    claims.require(Permission::ManageUsers)?;
    let users = ctx.repo::<User>().list().await?;
    let views = users.iter().map(UserView::from).collect();
    Ok(Json(listing::apply(views, &query)))
}

async fn get_user(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserView>, AppError> {
    claims.require(Permission::ManageUsers)?;
    let user = ctx.repo::<User>().get(&id).await?;
    Ok(Json(UserView::from(&user)))
}

async fn change_role(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ChangeRoleRequest>,
) -> Result<Json<UserView>, AppError> {
    claims.require_admin()?;
    if !body.confirm {
        return Err(AppError::invalid_field(
            "confirm",
            "confirmation_required",
            "role changes must be confirmed",
        ));
    }
    if claims.sub == id {
        return Err(AppError::bad_request("you cannot change your own role"));
    }

    let repo: Repository<User> = ctx.repo();
    let mut user = repo.get(&id).await?;
    let previous = user.role;
    user.role = body.role;
    user.updated_at = chrono::Utc::now();
    let user = repo.save(&user).await?;

    tracing::info!(
        user = %user.id,
        changed_by = %claims.sub,
        from = previous.as_str(),
        to = user.role.as_str(),
        "user role changed; effective at next login"
    );
    Ok(Json(UserView::from(&user)))
}

async fn update_permissions(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdatePermissionsRequest>,
) -> Result<Json<UserView>, AppError> {
    claims.require_admin()?;

    let repo: Repository<User> = ctx.repo();
    let mut user = repo.get(&id).await?;
    let mut permissions = body.permissions;
    permissions.sort();
    permissions.dedup();
    user.permissions = permissions;
    user.updated_at = chrono::Utc::now();
    let user = repo.save(&user).await?;
    Ok(Json(UserView::from(&user)))
}

async fn toggle_active(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserView>, AppError> {
    claims.require(Permission::ManageUsers)?;
    if claims.sub == id {
        return Err(AppError::bad_request("you cannot deactivate your own account"));
    }

    let repo: Repository<User> = ctx.repo();
    let mut user = repo.get(&id).await?;
    user.active = !user.active;
    user.updated_at = chrono::Utc::now();
    let user = repo.save(&user).await?;
    tracing::info!(user = %user.id, active = user.active, "user activation toggled");
    Ok(Json(UserView::from(&user)))
}

async fn delete_user(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require_admin()?;
    if claims.sub == id {
        return Err(AppError::bad_request("you cannot delete your own account"));
    }
    ctx.repo::<User>().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Create a new instance of the users module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UsersModule::new(ctx.clone()))
}
