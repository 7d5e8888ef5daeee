//! Axum extractors for the authenticated caller.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tripdesk_http::AppError;

use crate::token::{Claims, TokenService};
use crate::AuthError;

/// The verified claims of a bearer token. Rejects with 401 when absent or invalid.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// Claims when a valid bearer token is present, `None` otherwise.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Claims>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;
        let tokens = Arc::<TokenService>::from_ref(state);

        match tokens.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(AuthError::Expired) => Err(AppError::unauthorized("token has expired")),
            Err(err) => {
                tracing::debug!(error = %err, "rejected bearer token");
                Err(AppError::unauthorized("invalid bearer token"))
            }
        }
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        Ok(MaybeAuthUser(
            bearer_token(parts).and_then(|token| tokens.verify(token).ok()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use axum::http::Request;

    #[derive(Clone)]
    struct State {
        tokens: Arc<TokenService>,
    }

    impl FromRef<State> for Arc<TokenService> {
        fn from_ref(state: &State) -> Self {
            state.tokens.clone()
        }
    }

    fn parts(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn valid_bearer_token_is_extracted() {
        let state = State {
            tokens: Arc::new(TokenService::new("secret", 5)),
        };
        let issued = state.tokens.issue("u-9", "x@y.z", Role::Admin, &[]).unwrap();
        let mut parts = parts(Some(format!("Bearer {}", issued.access_token)));

        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(claims.sub, "u-9");
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized_but_optional_extractor_is_none() {
        let state = State {
            tokens: Arc::new(TokenService::new("secret", 5)),
        };
        let mut without = parts(None);
        assert!(AuthUser::from_request_parts(&mut without, &state).await.is_err());

        let mut garbage = parts(Some("Bearer nope".to_string()));
        let MaybeAuthUser(claims) = MaybeAuthUser::from_request_parts(&mut garbage, &state)
            .await
            .unwrap();
        assert!(claims.is_none());
    }
}
