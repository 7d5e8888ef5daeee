use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. Admins implicitly hold every permission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Dashboard areas a non-admin account can be granted.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManagePackages,
    ManageBlogs,
    ManageDestinations,
    ManageLeads,
    ManageMessages,
    ManageUsers,
    ManageTestimonials,
    ManageSubscribers,
    ManageApplications,
    ManageItineraries,
    ViewDashboard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&Permission::ManagePackages).unwrap(),
            "\"manage_packages\""
        );
    }
}
