use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tripdesk_http::AppError;
use utoipa::ToSchema;

use crate::role::{Permission, Role};
use crate::AuthError;

/// JWT claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.is_admin() || self.permissions.contains(&permission)
    }

    /// Fail with 403 unless the caller is an admin or holds `permission`
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.can(permission) {
            Ok(())
        } else {
            tracing::warn!(user = %self.sub, ?permission, "permission denied");
            Err(AppError::forbidden("you do not have access to this resource"))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::warn!(user = %self.sub, "admin role required");
            Err(AppError::forbidden("admin role required"))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Issues and verifies access tokens
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        permissions: &[Permission],
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            permissions: permissions.to_vec(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| AuthError::Encoding(err.to_string()))?;
        tracing::debug!(user = user_id, role = role.as_str(), "issued access token");

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl.num_seconds(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(err.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_and_carry_role() {
        let tokens = TokenService::new("test-secret", 30);
        let issued = tokens
            .issue("u-1", "ops@example.com", Role::User, &[Permission::ManageLeads])
            .unwrap();

        let claims = tokens.verify(&issued.access_token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, Role::User);
        assert!(claims.can(Permission::ManageLeads));
        assert!(!claims.can(Permission::ManageUsers));
        assert!(claims.require_admin().is_err());
        assert_eq!(issued.expires_in, 30 * 60);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let issuer = TokenService::new("one", 30);
        let verifier = TokenService::new("two", 30);
        let issued = issuer.issue("u-1", "a@b.c", Role::Admin, &[]).unwrap();
        assert!(matches!(
            verifier.verify(&issued.access_token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = TokenService::new("secret", -10);
        let issued = tokens.issue("u-1", "a@b.c", Role::Admin, &[]).unwrap();
        assert!(matches!(
            tokens.verify(&issued.access_token),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn admins_hold_every_permission() {
        let claims = Claims {
            sub: "root".to_string(),
            email: "root@example.com".to_string(),
            role: Role::Admin,
            permissions: vec![],
            iat: 0,
            exp: 0,
        };
        assert!(claims.require(Permission::ManageItineraries).is_ok());
    }
}
