//! Handlers for the `/products` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use stockroom_core::error::CoreError;
use stockroom_core::ids::{generate_product_id, MAX_ID_ATTEMPTS};
use stockroom_core::inventory::validate_product_fields;
use stockroom_core::locking::ResourceKind;
use stockroom_db::models::product::{CreateProduct, Product, ProductDeletion, UpdateProduct};
use stockroom_db::repositories::ProductRepo;

use crate::error::{AppError, AppResult};
use crate::gateway::MutationPermit;
use crate::middleware::session::SessionOwner;
use crate::response::LockAware;
use crate::state::AppState;

fn lock_aware(product: Product, session: Option<&SessionOwner>) -> LockAware<Product> {
    let locked_by = product.locked_by.clone();
    LockAware::new(
        product,
        locked_by.as_deref(),
        session.map(|s| s.owner_id.as_str()),
    )
}

/// POST /api/v1/products
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let Json(input) = payload?;
    validate_product_fields(&input.name, &input.unit, input.quantity)
        .map_err(AppError::validation)?;

    let id = unused_product_id(&state).await?;
    let product = ProductRepo::create(&state.pool, &id, &input).await?;

    tracing::info!(product_id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Generate a product id that is not taken yet.
async fn unused_product_id(state: &AppState) -> AppResult<String> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = generate_product_id(state.now());
        if !ProductRepo::exists(&state.pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::InternalError(format!(
        "Could not generate a unique product id in {MAX_ID_ATTEMPTS} attempts"
    )))
}

/// GET /api/v1/products
pub async fn list(
    State(state): State<AppState>,
    session: Option<SessionOwner>,
) -> AppResult<Json<Vec<LockAware<Product>>>> {
    let scope = state.lock_scope(ResourceKind::Product);
    let products = ProductRepo::list_for_display(&state.pool, &scope, state.now()).await?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| lock_aware(p, session.as_ref()))
            .collect(),
    ))
}

/// GET /api/v1/products/{id}
///
/// Clears the product's lock first if it has expired.
pub async fn get_by_id(
    State(state): State<AppState>,
    session: Option<SessionOwner>,
    Path(id): Path<String>,
) -> AppResult<Json<LockAware<Product>>> {
    let scope = state.lock_scope(ResourceKind::Product);
    let product = ProductRepo::find_for_display(&state.pool, &scope, &id, state.now())
        .await?
        .ok_or_else(|| AppError::not_found("Product", id))?;
    Ok(Json(lock_aware(product, session.as_ref())))
}

/// PUT /api/v1/products/{id}
///
/// Requires `X-Session-ID`; the session must be able to take the lock.
pub async fn update(
    State(state): State<AppState>,
    owner: SessionOwner,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProduct>, JsonRejection>,
) -> AppResult<Json<LockAware<Product>>> {
    let Json(input) = payload?;
    validate_product_fields(&input.name, &input.unit, input.quantity)
        .map_err(AppError::validation)?;

    let permit = MutationPermit::enter(&state, ResourceKind::Product, &id, &owner.owner_id).await?;

    let mut product = ProductRepo::update(&state.pool, &id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Product", id.clone()))?;

    tracing::info!(product_id = %id, owner_id = %owner.owner_id, "Product updated");

    if permit.finish_update(&state).await {
        product.locked_by = None;
        product.locked_at = None;
    }
    Ok(Json(lock_aware(product, Some(&owner))))
}

/// DELETE /api/v1/products/{id}
///
/// Refused with 409 while any sale references the product.
pub async fn delete(
    State(state): State<AppState>,
    owner: SessionOwner,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let permit = MutationPermit::enter(&state, ResourceKind::Product, &id, &owner.owner_id).await?;

    match ProductRepo::delete(&state.pool, &id).await? {
        ProductDeletion::Deleted => {
            permit.finish_delete();
            tracing::info!(product_id = %id, owner_id = %owner.owner_id, "Product deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        ProductDeletion::NotFound => Err(AppError::not_found("Product", id)),
        ProductDeletion::Referenced(count) => {
            Err(AppError::Core(CoreError::ReferentialIntegrity(format!(
                "Product {id} cannot be deleted: {count} sale(s) reference it"
            ))))
        }
    }
}
