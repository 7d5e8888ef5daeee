//! Authentication and authorization for TripDesk.
//!
//! Access tokens are HS256 JWTs that embed the user's role and permissions at
//! issue time. Nothing is invalidated server-side, so a role or permission
//! change takes effect the next time the user logs in.

pub mod extract;
pub mod password;
pub mod role;
pub mod token;

pub use extract::{AuthUser, MaybeAuthUser};
pub use role::{Permission, Role};
pub use token::{Claims, IssuedToken, TokenService};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to encode token: {0}")]
    Encoding(String),
    #[error("token has expired")]
    Expired,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("failed to hash password: {0}")]
    Hashing(String),
}
