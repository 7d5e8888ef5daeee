//! Tailored-travel questionnaire: step transitions and final submission.

pub mod matching;
pub mod wizard;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tripdesk_http::AppError;
use tripdesk_kernel::{InitCtx, Module};
use utoipa::ToSchema;
use validator::Validate;

use crate::context::AppContext;
use crate::modules::leads::models::{CreateLeadRequest, Lead, LeadSource};
use crate::modules::leads::record_lead;
use crate::modules::packages::models::Package;
use crate::utils::openapi::{ApiDoc, Body};
use matching::PackageMatch;
use wizard::{MissingAnswer, WizardAnswers, WizardState};

pub struct TailoredModule {
    ctx: AppContext,
}

impl TailoredModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub lead: Lead,
    pub matches: Vec<PackageMatch>,
}

#[async_trait]
impl Module for TailoredModule {
    fn name(&self) -> &'static str {
        "tailored"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "tailored module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/advance", post(advance))
            .route("/back", post(back))
            .route("/submit", post(submit))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Tailored travel")
                .schema::<WizardState>()
                .schema::<WizardAnswers>()
                .schema::<SubmitResponse>()
                .public(
                    "post",
                    "/advance",
                    "Validate the current step and move forward",
                    Body::Json("WizardState"),
                    Body::Json("WizardState"),
                )
                .public("post", "/back", "Move back one step", Body::Json("WizardState"), Body::Json("WizardState"))
                .public(
                    "post",
                    "/submit",
                    "Record the request as a lead and return matching packages",
                    Body::Json("WizardAnswers"),
                    Body::Json("SubmitResponse"),
                )
                .build(),
        )
    }
}

fn rejection(problems: Vec<MissingAnswer>) -> AppError {
    let details = problems
        .iter()
        .map(|problem| {
            serde_json::json!({
                "field": problem.field,
                "error": problem.error,
                "step": problem.step,
            })
        })
        .collect();
    AppError::validation(details, "some answers are missing")
}

async fn advance(Json(state): Json<WizardState>) -> Result<Json<WizardState>, AppError> {
    wizard::advance(state).map(Json).map_err(rejection)
}

async fn back(Json(state): Json<WizardState>) -> Json<WizardState> {
    Json(wizard::back(state))
}

fn lead_request(answers: &WizardAnswers) -> CreateLeadRequest {
    let destination = if answers.surprise_me && answers.wanted_destinations().next().is_none() {
        "Surprise me".to_string()
    } else {
        answers.wanted_destinations().collect::<Vec<_>>().join(", ")
    };

    let mut message = vec![format!("Duration: {} days", answers.duration_days)];
    if let Some(tier) = answers.budget {
        message.push(format!("Budget: {}", tier.as_str()));
    }
    let interests: Vec<&str> = answers
        .interests
        .iter()
        .map(|interest| interest.trim())
        .filter(|interest| !interest.is_empty())
        .collect();
    if !interests.is_empty() {
        message.push(format!("Interests: {}", interests.join(", ")));
    }
    if answers.children > 0 {
        message.push(format!("Adults: {}, children: {}", answers.adults, answers.children));
    }
    if !answers.notes.trim().is_empty() {
        message.push(answers.notes.trim().to_string());
    }

    CreateLeadRequest {
        name: answers.name.trim().to_string(),
        email: answers.email.trim().to_string(),
        phone: answers.phone.trim().to_string(),
        destination,
        travel_date: answers.start_date,
        travelers: answers.travelers(),
        budget: answers.budget.map(|tier| tier.as_str().to_string()).unwrap_or_default(),
        message: message.join("\n"),
        source: Some(LeadSource::Tailored),
    }
}

/// The lead is written before matching runs; a matching failure leaves it in
/// place.
async fn submit(
    State(ctx): State<AppContext>,
    Json(answers): Json<WizardAnswers>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let problems = wizard::check_all(&answers);
    if !problems.is_empty() {
        return Err(rejection(problems));
    }

    let request = lead_request(&answers);
    request.validate()?;
    let lead = record_lead(&ctx.repo(), request, LeadSource::Tailored).await?;
    let packages = ctx.repo::<Package>().list().await?;
    let matches = matching::rank(packages, &answers);
    tracing::info!(lead = %lead.id, matches = matches.len(), "tailored request submitted");

    Ok((StatusCode::CREATED, Json(SubmitResponse { lead, matches })))
}

/// Create a new instance of the tailored module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(TailoredModule::new(ctx.clone()))
}
