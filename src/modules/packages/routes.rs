use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tripdesk_authz::{AuthUser, MaybeAuthUser, Permission};
use tripdesk_db::Repository;
use tripdesk_http::AppError;
use validator::Validate;

use super::models::{GenerateRequest, GenerateResponse, JsonImportRequest, Package};
use crate::context::AppContext;
use crate::import::{self, reconcile, ImportPlan, ImportReport, ImportSummary, Workbook};
use crate::utils::listing::{self, ListQuery, Page};
use crate::utils::text::slugify;

pub(super) async fn list_packages(
    State(ctx): State<AppContext>,
    MaybeAuthUser(claims): MaybeAuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Package>>, AppError> {
    let show_drafts = claims.is_some_and(|claims| claims.can(Permission::ManagePackages));
    let packages = ctx
        .repo::<Package>()
        .list()
        .await?
        .into_iter()
        .filter(|package| show_drafts || package.published)
        .collect();
    Ok(Json(listing::apply(packages, &query)))
}

/// Looks up by id first, then by slug.
pub(super) async fn get_package(
    State(ctx): State<AppContext>,
    MaybeAuthUser(claims): MaybeAuthUser,
    Path(key): Path<String>,
) -> Result<Json<Package>, AppError> {
    let repo: Repository<Package> = ctx.repo();
    let package = match repo.get(&key).await {
        Ok(package) => Some(package),
        Err(tripdesk_db::StoreError::NotFound { .. }) => {
            repo.find_by("slug", &key).await?.into_iter().next()
        }
        Err(err) => return Err(err.into()),
    };

    let show_drafts = claims.is_some_and(|claims| claims.can(Permission::ManagePackages));
    package
        .filter(|package| show_drafts || package.published)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("package `{key}` not found")))
}

fn prepare(package: &mut Package) {
    package.destination_id = reconcile::normalize_id(&package.destination_id);
    package.title = package.title.trim().to_string();
    if package.slug.trim().is_empty() {
        package.slug = slugify(&package.title);
    }
}

pub(super) async fn create_package(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Json(mut body): Json<Package>,
) -> Result<(StatusCode, Json<Package>), AppError> {
    claims.require(Permission::ManagePackages)?;
    body.validate()?;
    prepare(&mut body);

    let now = Utc::now();
    body.id = String::new();
    body.created_at = now;
    body.updated_at = now;
    let package = ctx.repo::<Package>().create(body).await?;

    tracing::info!(package = %package.id, destination_id = %package.destination_id, "package created");
    Ok((StatusCode::CREATED, Json(package)))
}

pub(super) async fn update_package(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(mut body): Json<Package>,
) -> Result<Json<Package>, AppError> {
    claims.require(Permission::ManagePackages)?;
    body.validate()?;
    prepare(&mut body);

    let repo: Repository<Package> = ctx.repo();
    let existing = repo.get(&id).await?;
    body.id = existing.id;
    body.created_at = existing.created_at;
    body.updated_at = Utc::now();
    Ok(Json(repo.save(&body).await?))
}

pub(super) async fn delete_package(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    claims.require(Permission::ManagePackages)?;
    ctx.repo::<Package>().delete(&id).await?;
    tracing::info!(package = %id, "package deleted");
    Ok(Json(serde_json::json!({ "deleted": id })))
}

pub(super) async fn generate_packages(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    claims.require(Permission::ManagePackages)?;
    if body.packages.is_empty() {
        return Err(AppError::invalid_field(
            "packages",
            "required",
            "at least one package skeleton is required",
        ));
    }

    let packages = ctx.completer.complete(body.packages).await?;
    tracing::info!(count = packages.len(), completer = ctx.completer.name(), "packages generated");
    Ok(Json(GenerateResponse { packages }))
}

async fn workbook_plan(ctx: &AppContext, body: Bytes) -> Result<ImportPlan, AppError> {
    if body.is_empty() {
        return Err(AppError::bad_request("request body must contain a workbook"));
    }
    let workbook = Workbook::from_bytes(body.to_vec())?;
    let existing = reconcile::existing_ids(&ctx.repo::<Package>().list().await?);
    Ok(import::plan_workbook(
        &workbook,
        &existing,
        &ctx.settings.generator.default_currency,
    )?)
}

async fn list_plan(ctx: &AppContext, body: JsonImportRequest) -> Result<ImportPlan, AppError> {
    let existing = reconcile::existing_ids(&ctx.repo::<Package>().list().await?);
    Ok(import::plan_packages(body.packages, &existing))
}

pub(super) async fn preview_import(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    body: Bytes,
) -> Result<Json<ImportSummary>, AppError> {
    claims.require(Permission::ManagePackages)?;
    let plan = workbook_plan(&ctx, body).await?;
    Ok(Json(plan.summary()))
}

pub(super) async fn commit_import(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    body: Bytes,
) -> Result<Json<ImportReport>, AppError> {
    claims.require(Permission::ManagePackages)?;
    let plan = workbook_plan(&ctx, body).await?;
    Ok(Json(import::commit(&ctx.repo(), plan).await))
}

pub(super) async fn preview_json_import(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Json(body): Json<JsonImportRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    claims.require(Permission::ManagePackages)?;
    let plan = list_plan(&ctx, body).await?;
    Ok(Json(plan.summary()))
}

pub(super) async fn commit_json_import(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
    Json(body): Json<JsonImportRequest>,
) -> Result<Json<ImportReport>, AppError> {
    claims.require(Permission::ManagePackages)?;
    let plan = list_plan(&ctx, body).await?;
    Ok(Json(import::commit(&ctx.repo(), plan).await))
}
