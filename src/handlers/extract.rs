//! Request extractors whose rejections render as the standard error envelope.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain-text bodies; these
//! wrappers convert the rejection into a [`ServiceError`] instead.

use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// JSON request body that may be left out; an empty body yields `T::default()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|err| ServiceError::invalid_field("body", err.to_string()))
    }
}

/// Path parameters.
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Query string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkOrderStatus;
    use assert_matches::assert_matches;
    use axum::{body::Body, http::Request as HttpRequest};
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct StatusBody {
        status: Option<WorkOrderStatus>,
    }

    fn json_request(body: &'static str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_enum_value_is_a_validation_error() {
        let result = ApiJson::<StatusBody>::from_request(json_request(r#"{"status":"PAID"}"#), &()).await;
        assert_matches!(result, Err(ServiceError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn broken_json_is_a_bad_request() {
        let result = ApiJson::<StatusBody>::from_request(json_request("{"), &()).await;
        assert_matches!(result, Err(ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn optional_body_defaults_when_empty() {
        let OptionalJson(body) = OptionalJson::<StatusBody>::from_request(json_request(""), &())
            .await
            .unwrap();
        assert!(body.status.is_none());

        let result =
            OptionalJson::<StatusBody>::from_request(json_request(r#"{"status":1}"#), &()).await;
        assert_matches!(result, Err(ServiceError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn bad_query_is_a_validation_error() {
        #[derive(Debug, Deserialize)]
        struct Paging {
            #[allow(dead_code)]
            page: u64,
        }
        let (mut parts, _) = HttpRequest::builder()
            .uri("/?page=first")
            .body(())
            .unwrap()
            .into_parts();
        let result = ApiQuery::<Paging>::from_request_parts(&mut parts, &()).await;
        assert_matches!(result, Err(ServiceError::ValidationError { .. }));
    }
}
