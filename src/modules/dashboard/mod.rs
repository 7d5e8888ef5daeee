//! Admin dashboard figures.

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tripdesk_authz::{AuthUser, Permission};
use tripdesk_db::{DocumentStore, StoreResult};
use tripdesk_http::AppError;
use tripdesk_kernel::{InitCtx, Module};
use utoipa::ToSchema;

use crate::context::AppContext;
use crate::modules::blogs::models::BlogPost;
use crate::modules::contact::models::ContactMessage;
use crate::modules::leads::models::{Lead, LeadStatus};
use crate::modules::subscribers::models::Subscriber;
use crate::utils::openapi::{ApiDoc, Body};

const RECENT_LEADS: usize = 5;

/// Collections counted on the dashboard.
pub const COLLECTIONS: [&str; 10] = [
    "packages",
    "blogs",
    "users",
    "leads",
    "contact_messages",
    "newsletter_subscribers",
    "job_applications",
    "destinations",
    "testimonials",
    "customer_itineraries",
];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub counts: BTreeMap<String, u64>,
    pub leads_by_status: BTreeMap<String, u64>,
    pub unread_messages: u64,
    pub published_blogs: u64,
    pub active_subscribers: u64,
    pub recent_leads: Vec<Lead>,
}

pub struct DashboardModule {
    ctx: AppContext,
}

impl DashboardModule {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Module for DashboardModule {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "dashboard module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/stats", get(stats))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(
            ApiDoc::new("Dashboard")
                .schema::<DashboardStats>()
                .secured("get", "/stats", "Headline figures", Body::Empty, Body::Json("DashboardStats"))
                .build(),
        )
    }
}

async fn collection_counts(store: &dyn DocumentStore) -> StoreResult<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    for collection in COLLECTIONS {
        counts.insert(collection.to_string(), store.count(collection).await?);
    }
    Ok(counts)
}

pub async fn gather(ctx: &AppContext) -> StoreResult<DashboardStats> {
    let leads_repo = ctx.repo::<Lead>();
    let messages_repo = ctx.repo::<ContactMessage>();
    let blogs_repo = ctx.repo::<BlogPost>();
    let subscribers_repo = ctx.repo::<Subscriber>();

    let (counts, mut leads, messages, blogs, subscribers) = tokio::try_join!(
        collection_counts(ctx.store.as_ref()),
        leads_repo.list(),
        messages_repo.list(),
        blogs_repo.list(),
        subscribers_repo.list(),
    )?;

    let mut leads_by_status: BTreeMap<String, u64> = [LeadStatus::New, LeadStatus::Contacted, LeadStatus::Converted]
        .into_iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();
    for lead in &leads {
        *leads_by_status.entry(lead.status.as_str().to_string()).or_default() += 1;
    }

    leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    leads.truncate(RECENT_LEADS);

    Ok(DashboardStats {
        counts,
        leads_by_status,
        unread_messages: messages.iter().filter(|message| !message.read).count() as u64,
        published_blogs: blogs.iter().filter(|post| post.published).count() as u64,
        active_subscribers: subscribers.iter().filter(|subscriber| subscriber.active).count() as u64,
        recent_leads: leads,
    })
}

async fn stats(
    State(ctx): State<AppContext>,
    AuthUser(claims): AuthUser,
) -> Result<Json<DashboardStats>, AppError> {
    claims.require(Permission::ViewDashboard)?;
    Ok(Json(gather(&ctx).await?))
}

/// Create a new instance of the dashboard module
pub fn create_module(ctx: &AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(DashboardModule::new(ctx.clone()))
}
