use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_db::Record;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::listing::{Listable, SortKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Converted,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Converted => "converted",
        }
    }

    /// `new → contacted → converted → new`
    pub fn next(self) -> Self {
        match self {
            LeadStatus::New => LeadStatus::Contacted,
            LeadStatus::Contacted => LeadStatus::Converted,
            LeadStatus::Converted => LeadStatus::New,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    #[default]
    Website,
    Tailored,
    Contact,
    Manual,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Website => "website",
            LeadSource::Tailored => "tailored",
            LeadSource::Contact => "contact",
            LeadSource::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct Lead {
    pub id: String,
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: String,
    pub destination: String,
    pub travel_date: Option<NaiveDate>,
    pub travelers: u32,
    pub budget: String,
    pub message: String,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Lead {
    const COLLECTION: &'static str = "leads";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Listable for Lead {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.destination.as_str(),
            self.message.as_str(),
        ]
    }

    fn status_facet(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn category_facet(&self) -> Option<&str> {
        Some(self.source.as_str())
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::text(&self.name)),
            "email" => Some(SortKey::text(&self.email)),
            "destination" => Some(SortKey::text(&self.destination)),
            "status" => Some(SortKey::text(self.status.as_str())),
            "travel_date" => Some(SortKey::text(
                &self.travel_date.map(|d| d.to_string()).unwrap_or_default(),
            )),
            "created_at" => Some(SortKey::Time(self.created_at)),
            "updated_at" => Some(SortKey::Time(self.updated_at)),
            _ => None,
        }
    }
}

/// Public inquiry form.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 40))]
    pub phone: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub travel_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(range(max = 100))]
    pub travelers: u32,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub message: String,
    #[serde(default)]
    pub source: Option<LeadSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_cycles_through_three_states() {
        let mut status = LeadStatus::New;
        let mut seen = Vec::new();
        for _ in 0..4 {
            status = status.next();
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                LeadStatus::Contacted,
                LeadStatus::Converted,
                LeadStatus::New,
                LeadStatus::Contacted
            ]
        );
    }
}
