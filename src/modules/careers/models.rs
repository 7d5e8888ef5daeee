use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_db::Record;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::listing::{Listable, SortKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    New,
    Reviewing,
    Shortlisted,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct JobApplication {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub experience_years: f32,
    pub resume_url: String,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for JobApplication {
    const COLLECTION: &'static str = "job_applications";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Listable for JobApplication {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.position.as_str(),
        ]
    }

    fn status_facet(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn category_facet(&self) -> Option<&str> {
        Some(self.position.as_str())
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::text(&self.name)),
            "position" => Some(SortKey::text(&self.position)),
            "experience_years" => Some(SortKey::Number(f64::from(self.experience_years))),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ApplyRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 40))]
    pub phone: String,
    #[validate(length(min = 1, max = 120))]
    pub position: String,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 60.0))]
    pub experience_years: f32,
    #[validate(url)]
    pub resume_url: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub cover_letter: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApplicationStatusRequest {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
}
