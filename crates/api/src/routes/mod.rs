pub mod health;
pub mod lock;
pub mod product;
pub mod sale;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /products                                        list, create
/// /products/{id}                                   get, update, delete (lock-gated)
///
/// /sales                                           list, create
/// /sales/{id}                                      get, update, delete (lock-gated)
///
/// /locks                                           acquire (POST), release (DELETE)
/// /locks/{resource_kind}/{resource_id}             lock status (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product::router())
        .nest("/sales", sale::router())
        .nest("/locks", lock::router())
}
