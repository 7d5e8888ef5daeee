use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_db::Record;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::listing::{Listable, SortKey};

/// A place packages are sold for. `code` is the prefix package IDs start with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct Destination {
    pub id: String,
    #[validate(length(min = 1, max = 16, message = "code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    pub slug: String,
    pub country: String,
    pub region: String,
    pub description: String,
    pub best_time_to_visit: String,
    pub image_url: String,
    pub popular: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Destination {
    const COLLECTION: &'static str = "destinations";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Listable for Destination {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.code.as_str(),
            self.name.as_str(),
            self.country.as_str(),
            self.region.as_str(),
        ]
    }

    fn status_facet(&self) -> Option<&str> {
        Some(if self.popular { "popular" } else { "standard" })
    }

    fn category_facet(&self) -> Option<&str> {
        Some(self.region.as_str())
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "code" => Some(SortKey::text(&self.code)),
            "name" => Some(SortKey::text(&self.name)),
            "country" => Some(SortKey::text(&self.country)),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }

    fn default_sort() -> &'static str {
        "name"
    }
}
