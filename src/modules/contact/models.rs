use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_db::Record;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::listing::{Listable, SortKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    New,
    Replied,
    Archived,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::New => "new",
            MessageStatus::Replied => "replied",
            MessageStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub status: MessageStatus,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for ContactMessage {
    const COLLECTION: &'static str = "contact_messages";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Listable for ContactMessage {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.subject.as_str(),
            self.message.as_str(),
        ]
    }

    fn status_facet(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn category_facet(&self) -> Option<&str> {
        Some(if self.read { "read" } else { "unread" })
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::text(&self.name)),
            "subject" => Some(SortKey::text(&self.subject)),
            "created_at" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 40))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MarkReadRequest {
    #[serde(default = "default_read")]
    pub read: bool,
}

fn default_read() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MessageStatusRequest {
    pub status: MessageStatus,
}
