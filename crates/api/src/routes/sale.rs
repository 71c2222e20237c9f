//! Route definitions for the `/sales` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::sale;
use crate::state::AppState;

/// Routes mounted at `/sales`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create   (X-Session-ID)
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update   (X-Session-ID, lock-gated)
/// DELETE /{id}                              -> delete   (X-Session-ID, lock-gated)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sale::list).post(sale::create))
        .route(
            "/{id}",
            get(sale::get_by_id).put(sale::update).delete(sale::delete),
        )
}
