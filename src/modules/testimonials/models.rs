use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_db::Record;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::listing::{Listable, SortKey};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct Testimonial {
    pub id: String,
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    pub location: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[validate(length(min = 1, max = 2000, message = "message is required"))]
    pub message: String,
    pub trip: String,
    pub image_url: String,
    pub approved: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Testimonial {
    const COLLECTION: &'static str = "testimonials";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Listable for Testimonial {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.location.as_str(),
            self.trip.as_str(),
            self.message.as_str(),
        ]
    }

    fn status_facet(&self) -> Option<&str> {
        Some(if self.approved { "approved" } else { "pending" })
    }

    fn category_facet(&self) -> Option<&str> {
        Some(if self.featured { "featured" } else { "regular" })
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::text(&self.name)),
            "rating" => Some(SortKey::Number(f64::from(self.rating))),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }
}

/// Public submission; moderation fields are not accepted.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitTestimonialRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub location: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(default)]
    pub trip: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApproveRequest {
    #[serde(default = "default_true")]
    pub approved: bool,
}

fn default_true() -> bool {
    true
}
