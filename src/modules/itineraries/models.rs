use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_db::Record;
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::packages::models::ItineraryDay;
use crate::utils::listing::{Listable, SortKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItineraryStatus {
    #[default]
    Draft,
    Confirmed,
    Completed,
    Cancelled,
}

impl ItineraryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItineraryStatus::Draft => "draft",
            ItineraryStatus::Confirmed => "confirmed",
            ItineraryStatus::Completed => "completed",
            ItineraryStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct HotelStay {
    pub city: String,
    pub name: String,
    pub nights: u32,
    pub room_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub actor: String,
    pub action: String,
    #[serde(default)]
    pub detail: String,
}

/// A trip prepared for one customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct CustomerItinerary {
    pub id: String,
    /// Customer-facing reference, generated when left empty
    pub reference: String,
    #[validate(length(min = 1, message = "customer_name is required"))]
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[validate(length(min = 1, message = "destination is required"))]
    pub destination: String,
    pub package_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub adults: u32,
    pub children: u32,
    pub days: Vec<ItineraryDay>,
    pub hotels: Vec<HotelStay>,
    pub transport: String,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    #[validate(range(min = 0.0))]
    pub total_cost: f64,
    #[validate(range(min = 0.0))]
    pub advance_paid: f64,
    /// Always `total_cost - advance_paid`; client values are overwritten
    pub balance_due: f64,
    pub currency: String,
    pub status: ItineraryStatus,
    pub notes: String,
    /// Append-only; client values are ignored
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerItinerary {
    /// Exact difference; amounts are not rounded.
    pub fn recompute_balance(&mut self) {
        self.balance_due = self.total_cost - self.advance_paid;
    }

    pub fn record(&mut self, actor: &str, action: &str, detail: impl Into<String>) {
        self.history.push(HistoryEntry {
            at: Utc::now(),
            actor: actor.to_string(),
            action: action.to_string(),
            detail: detail.into(),
        });
    }

    pub fn travelers(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    /// Length in days from the date range, else from the day plan.
    pub fn day_count(&self) -> u32 {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end >= start => (end - start).num_days() as u32 + 1,
            _ => self.days.len() as u32,
        }
    }
}

impl Record for CustomerItinerary {
    const COLLECTION: &'static str = "customer_itineraries";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Listable for CustomerItinerary {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.reference.as_str(),
            self.customer_name.as_str(),
            self.customer_email.as_str(),
            self.destination.as_str(),
        ]
    }

    fn status_facet(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "reference" => Some(SortKey::text(&self.reference)),
            "customer_name" => Some(SortKey::text(&self.customer_name)),
            "destination" => Some(SortKey::text(&self.destination)),
            "total_cost" => Some(SortKey::Number(self.total_cost)),
            "balance_due" => Some(SortKey::Number(self.balance_due)),
            "start_date" => Some(SortKey::text(
                &self.start_date.map(|d| d.to_string()).unwrap_or_default(),
            )),
            "created_at" => Some(SortKey::Time(self.created_at)),
            "updated_at" => Some(SortKey::Time(self.updated_at)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NoteRequest {
    #[validate(length(min = 1, max = 2000))]
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_is_total_minus_advance() {
        let mut itinerary = CustomerItinerary {
            total_cost: 2450.50,
            advance_paid: 1000.25,
            balance_due: 9999.0,
            ..CustomerItinerary::default()
        };
        itinerary.recompute_balance();
        assert_eq!(itinerary.balance_due, 1450.25);

        itinerary.total_cost = 100.333;
        itinerary.advance_paid = 0.0;
        itinerary.recompute_balance();
        assert_eq!(itinerary.balance_due, 100.333);
    }

    #[test]
    fn traveler_count_saturates() {
        let itinerary = CustomerItinerary {
            adults: u32::MAX,
            children: 3,
            ..CustomerItinerary::default()
        };
        assert_eq!(itinerary.travelers(), u32::MAX);
    }

    #[test]
    fn day_count_prefers_dates() {
        let mut itinerary = CustomerItinerary {
            days: vec![ItineraryDay::default(); 2],
            ..CustomerItinerary::default()
        };
        assert_eq!(itinerary.day_count(), 2);

        itinerary.start_date = NaiveDate::from_ymd_opt(2026, 3, 1);
        itinerary.end_date = NaiveDate::from_ymd_opt(2026, 3, 5);
        assert_eq!(itinerary.day_count(), 5);
    }
}
