use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_db::Record;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::listing::{Listable, SortKey};

/// A sellable travel package.
///
/// `destination_id` is the human-assigned key used by the bulk import; it is
/// not unique at the storage layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct Package {
    pub id: String,
    #[serde(alias = "Destination_ID")]
    #[validate(length(min = 1, message = "destination_id is required"))]
    pub destination_id: String,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub slug: String,
    pub destination_name: String,
    pub country: String,
    pub region: String,
    pub package_type: String,
    /// Display label such as `5N/6D`
    pub duration: String,
    pub duration_days: u32,
    pub nights: u32,
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub original_price: Option<f64>,
    pub currency: String,
    pub price_unit: String,
    pub overview: String,
    pub description: String,
    pub highlights: Vec<String>,
    pub itinerary_summary: String,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub activities: Vec<String>,
    pub best_time_to_visit: String,
    pub ideal_for: String,
    pub hotel_category: String,
    pub transport: String,
    pub meals: String,
    pub start_city: String,
    pub end_city: String,
    pub min_group_size: Option<u32>,
    pub max_group_size: Option<u32>,
    pub image_url: String,
    pub gallery: Vec<String>,
    pub tags: Vec<String>,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
    pub featured: bool,
    pub published: bool,
    pub cancellation_policy: String,
    pub day_wise_itinerary: Vec<ItineraryDay>,
    pub guest_reviews: Vec<GuestReview>,
    pub faqs: Vec<Faq>,
    pub booking_policies: Vec<BookingPolicy>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    pub description: String,
    pub meals: String,
    pub accommodation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct GuestReview {
    pub name: String,
    pub rating: f64,
    pub comment: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookingPolicy {
    pub policy_type: String,
    pub description: String,
}

impl Record for Package {
    const COLLECTION: &'static str = "packages";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Listable for Package {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.destination_id.as_str(),
            self.destination_name.as_str(),
            self.country.as_str(),
            self.package_type.as_str(),
        ]
    }

    fn status_facet(&self) -> Option<&str> {
        Some(if self.published { "published" } else { "draft" })
    }

    fn category_facet(&self) -> Option<&str> {
        Some(self.package_type.as_str())
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "title" => Some(SortKey::text(&self.title)),
            "destination_id" => Some(SortKey::text(&self.destination_id)),
            "price" => Some(SortKey::Number(self.price)),
            "duration_days" => Some(SortKey::Number(f64::from(self.duration_days))),
            "rating" => Some(SortKey::Number(self.rating.unwrap_or(0.0))),
            "created_at" => Some(SortKey::Time(self.created_at)),
            "updated_at" => Some(SortKey::Time(self.updated_at)),
            _ => None,
        }
    }
}

/// Body of `POST /generate`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub packages: Vec<Package>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub packages: Vec<Package>,
}

/// Body of the JSON import endpoints.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct JsonImportRequest {
    pub packages: Vec<Package>,
}
