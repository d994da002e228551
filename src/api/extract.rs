//! Request extractors whose rejections use the API error body

use async_trait::async_trait;
use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;

/// `Json<T>` that rejects malformed bodies with a `{detail, code, request_id}` 400
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
