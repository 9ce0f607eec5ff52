use std::ops::Deref;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::de::DeserializeOwned;
use serde_querystring::ParseMode;

use crate::infrastructure::http::api::ApiError;

/// Query string extractor. Malformed queries are rejected with 422 and the
/// regular error body.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryString<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryString<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        let value = serde_querystring::from_str(query, ParseMode::UrlEncoded).map_err(|e| {
            ApiError::UnprocessableEntity(format!("invalid query string: {}", e))
        })?;
        Ok(QueryString(value))
    }
}

impl<T> Deref for QueryString<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Params {
        period: Option<String>,
        project_id: Option<String>,
    }

    async fn extract(uri: &str) -> Result<Params, ApiError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        QueryString::<Params>::from_request_parts(&mut parts, &())
            .await
            .map(|q| q.0)
    }

    #[tokio::test]
    async fn test_reads_camel_case_parameters() {
        let params = extract("/stats?period=week&projectId=abc").await.unwrap();
        assert_eq!(params.period.as_deref(), Some("week"));
        assert_eq!(params.project_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_empty_query_gives_defaults() {
        let params = extract("/stats").await.unwrap();
        assert_eq!(
            params,
            Params {
                period: None,
                project_id: None
            }
        );
    }
}
