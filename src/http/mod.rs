//! HTTP surface
//!
//! Two JSON endpoints over the hash store:
//! - `POST /list` returns every field of a hash.
//! - `POST /add` writes fields into a hash.
//!
//! Handlers receive the shared store through an `Extension` layer; no handler
//! builds its own client.

pub mod handlers;
pub mod protocol;


use axum::{Extension, Router, routing::post};

use handlers::{SharedStore, handle_add, handle_list};
use protocol::{ENDPOINT_ADD, ENDPOINT_LIST};

/// Build the router with `store` injected into every handler
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route(ENDPOINT_LIST, post(handle_list))
        .route(ENDPOINT_ADD, post(handle_add))
        .layer(Extension(store))
}
