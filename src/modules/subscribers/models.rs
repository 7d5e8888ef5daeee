use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_db::Record;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::listing::{Listable, SortKey};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Subscriber {
    pub id: String,
    /// Lowercased
    pub email: String,
    pub source: String,
    pub active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Subscriber {
    const COLLECTION: &'static str = "newsletter_subscribers";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Listable for Subscriber {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.email.as_str(), self.source.as_str()]
    }

    fn status_facet(&self) -> Option<&str> {
        Some(if self.active { "active" } else { "inactive" })
    }

    fn category_facet(&self) -> Option<&str> {
        Some(self.source.as_str())
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "email" => Some(SortKey::text(&self.email)),
            "subscribed_at" => Some(SortKey::Time(self.subscribed_at)),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }

    fn default_sort() -> &'static str {
        "subscribed_at"
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubscribeRequest {
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 60))]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UnsubscribeRequest {
    #[validate(email)]
    pub email: String,
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `email,source,active,subscribed_at,unsubscribed_at` with a header row.
pub fn to_csv(subscribers: &[Subscriber]) -> String {
    let mut out = String::from("email,source,active,subscribed_at,unsubscribed_at\n");
    for subscriber in subscribers {
        let row = [
            csv_field(&subscriber.email),
            csv_field(&subscriber.source),
            subscriber.active.to_string(),
            subscriber.subscribed_at.to_rfc3339(),
            subscriber
                .unsubscribed_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_quotes_awkward_values() {
        let csv = to_csv(&[Subscriber {
            email: "a@example.com".into(),
            source: "footer, blog".into(),
            active: true,
            ..Subscriber::default()
        }]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("email,source,active,subscribed_at,unsubscribed_at"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("a@example.com,\"footer, blog\",true,"));
        assert!(row.ends_with(','));
    }
}
