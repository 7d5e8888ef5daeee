use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_authz::{Permission, Role};
use tripdesk_db::Record;
use utoipa::ToSchema;

use crate::utils::listing::{Listable, SortKey};

/// Stored account. Never serialized to clients directly: see [`UserView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Record for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Account as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            permissions: user.permissions.clone(),
            active: user.active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl Listable for UserView {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.email.as_str(), self.display_name.as_str()]
    }

    fn status_facet(&self) -> Option<&str> {
        Some(if self.active { "active" } else { "inactive" })
    }

    fn category_facet(&self) -> Option<&str> {
        Some(self.role.as_str())
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "email" => Some(SortKey::text(&self.email)),
            "display_name" => Some(SortKey::text(&self.display_name)),
            "created_at" => Some(SortKey::Time(self.created_at)),
            "last_login_at" => self.last_login_at.map(SortKey::Time),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: Role,
    /// Must be `true`; the change is refused otherwise.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePermissionsRequest {
    pub permissions: Vec<Permission>,
}
