use axum::{extract::FromRequestParts, http::request::Parts};
use shelf_common::UserId;

use crate::infrastructure::http::api::ApiError;

/// Header set by the upstream identity gateway
pub const USER_ID_HEADER: &str = "x-user-id";

fn caller_id(parts: &Parts) -> Option<UserId> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| UserId::try_from(value.trim()).ok())
}

/// The requester, `None` when anonymous. A malformed identity counts as anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester(pub Option<UserId>);

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Requester(caller_id(parts)))
    }
}

/// An authenticated caller, anonymous requests are rejected with 401
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_id(parts).map(Caller).ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn requester(header: Option<&str>) -> Option<UserId> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Requester::from_request_parts(&mut parts, &()).await.unwrap().0
    }

    #[tokio::test]
    async fn test_valid_header_identifies_user() {
        let id = UserId::generate();
        assert_eq!(requester(Some(&id.to_string())).await, Some(id));
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_anonymous() {
        assert_eq!(requester(None).await, None);
        assert_eq!(requester(Some("not-a-uuid")).await, None);
    }

    #[tokio::test]
    async fn test_caller_requires_identity() {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let rejection = Caller::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(rejection, ApiError::Unauthorized);
    }
}
