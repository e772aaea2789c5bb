use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::protocol::{AddRequest, ListRequest, ListResponse};
use crate::store::{HashStore, StoreError};

/// Shared store handle injected into every handler
pub type SharedStore = Arc<dyn HashStore>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid Body")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Invalid Body Parameter")]
    MissingKey,

    #[error("Internal Error getting values")]
    Store(#[source] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) | ApiError::MissingKey => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Decode the first JSON value of the buffered body; bytes after it are ignored
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let first = serde_json::Deserializer::from_slice(body).into_iter::<T>().next();
    // No value at all (empty or blank body): `from_slice` reports the EOF error.
    first.unwrap_or_else(|| serde_json::from_slice(body)).map_err(|e| {
        warn!("Failed to decode request body: {}", e);
        ApiError::InvalidBody(e)
    })
}

fn require_key(key: &str) -> Result<(), ApiError> {
    if key.is_empty() {
        warn!("Request rejected: empty key");
        return Err(ApiError::MissingKey);
    }
    Ok(())
}

/// `POST /list`: every field/value under `key`
pub async fn handle_list(
    Extension(store): Extension<SharedStore>,
    body: Bytes,
) -> Result<Json<ListResponse>, ApiError> {
    let req: ListRequest = decode(&body)?;
    require_key(&req.key)?;

    let data = store.get_all(&req.key).await.map_err(|e| {
        error!(key = %req.key, error = %e, "Failed to list hash");
        ApiError::Store(e)
    })?;

    Ok(Json(ListResponse { data }))
}

/// `POST /add`: write the payload fields under `key`.
///
/// Once validation passes the response is always 200 with an empty body; a
/// failed write is only logged.
pub async fn handle_add(
    Extension(store): Extension<SharedStore>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let req: AddRequest = decode(&body)?;
    require_key(&req.key)?;

    match store.set(&req.key, &req.fields()).await {
        Ok(added) => debug!(key = %req.key, added, "Stored hash fields"),
        Err(e) => error!(key = %req.key, error = %e, "Failed to store hash fields"),
    }

    Ok(StatusCode::OK)
}
