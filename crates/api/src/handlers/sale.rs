//! Handlers for the `/sales` resource (sales transactions).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use stockroom_core::error::CoreError;
use stockroom_core::ids::{generate_transaction_id, MAX_ID_ATTEMPTS};
use stockroom_core::inventory::validate_sale_quantity;
use stockroom_core::locking::{validate_resource_id, ResourceKind};
use stockroom_db::models::sale::{CreateSale, Sale, SaleWrite, UpdateSale};
use stockroom_db::repositories::SaleRepo;

use crate::error::{AppError, AppResult};
use crate::gateway::MutationPermit;
use crate::middleware::session::SessionOwner;
use crate::response::LockAware;
use crate::state::AppState;

fn lock_aware(sale: Sale, session: Option<&SessionOwner>) -> LockAware<Sale> {
    let locked_by = sale.locked_by.clone();
    LockAware::new(
        sale,
        locked_by.as_deref(),
        session.map(|s| s.owner_id.as_str()),
    )
}

fn validate_sale(product_id: &str, quantity: i32) -> AppResult<()> {
    validate_resource_id(product_id)
        .map_err(|e| AppError::validation(format!("product_id: {e}")))?;
    validate_sale_quantity(quantity).map_err(AppError::validation)
}

/// Map a stock-moving write outcome to the written sale or an error.
fn written(outcome: SaleWrite, sale_id: &str, product_id: &str, requested: i32) -> AppResult<Sale> {
    match outcome {
        SaleWrite::Written(sale) => Ok(sale),
        SaleWrite::SaleNotFound => Err(AppError::not_found("Transaction", sale_id)),
        SaleWrite::ProductNotFound => Err(AppError::not_found("Product", product_id)),
        SaleWrite::InsufficientStock { available } => {
            Err(AppError::Core(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                requested,
                available,
            }))
        }
    }
}

/// POST /api/v1/sales
///
/// Requires `X-Session-ID`, which seeds the transaction id. The product's
/// stock is checked before anything is written.
pub async fn create(
    State(state): State<AppState>,
    owner: SessionOwner,
    payload: Result<Json<CreateSale>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Sale>)> {
    let Json(input) = payload?;
    validate_sale(&input.product_id, input.quantity)?;

    let id = unused_transaction_id(&state, &owner.owner_id).await?;
    let outcome = SaleRepo::create(&state.pool, &id, &input).await?;
    let sale = written(outcome, &id, &input.product_id, input.quantity)?;

    tracing::info!(
        transaction_id = %sale.id,
        product_id = %sale.product_id,
        quantity = sale.quantity,
        "Sale recorded"
    );
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Generate a transaction id that is not taken yet.
async fn unused_transaction_id(state: &AppState, owner_id: &str) -> AppResult<String> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = generate_transaction_id(owner_id, state.now());
        if !SaleRepo::exists(&state.pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::InternalError(format!(
        "Could not generate a unique transaction id in {MAX_ID_ATTEMPTS} attempts"
    )))
}

/// GET /api/v1/sales
pub async fn list(
    State(state): State<AppState>,
    session: Option<SessionOwner>,
) -> AppResult<Json<Vec<LockAware<Sale>>>> {
    let scope = state.lock_scope(ResourceKind::Transaction);
    let sales = SaleRepo::list_for_display(&state.pool, &scope, state.now()).await?;
    Ok(Json(
        sales
            .into_iter()
            .map(|s| lock_aware(s, session.as_ref()))
            .collect(),
    ))
}

/// GET /api/v1/sales/{id}
///
/// Clears the sale's lock first if it has expired.
pub async fn get_by_id(
    State(state): State<AppState>,
    session: Option<SessionOwner>,
    Path(id): Path<String>,
) -> AppResult<Json<LockAware<Sale>>> {
    let scope = state.lock_scope(ResourceKind::Transaction);
    let sale = SaleRepo::find_for_display(&state.pool, &scope, &id, state.now())
        .await?
        .ok_or_else(|| AppError::not_found("Transaction", id))?;
    Ok(Json(lock_aware(sale, session.as_ref())))
}

/// PUT /api/v1/sales/{id}
///
/// Requires `X-Session-ID`; the session must be able to take the lock.
pub async fn update(
    State(state): State<AppState>,
    owner: SessionOwner,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSale>, JsonRejection>,
) -> AppResult<Json<LockAware<Sale>>> {
    let Json(input) = payload?;
    validate_sale(&input.product_id, input.quantity)?;

    let permit =
        MutationPermit::enter(&state, ResourceKind::Transaction, &id, &owner.owner_id).await?;

    let outcome = SaleRepo::update(&state.pool, &id, &input).await?;
    let mut sale = written(outcome, &id, &input.product_id, input.quantity)?;

    tracing::info!(transaction_id = %id, owner_id = %owner.owner_id, "Sale updated");

    if permit.finish_update(&state).await {
        sale.locked_by = None;
        sale.locked_at = None;
    }
    Ok(Json(lock_aware(sale, Some(&owner))))
}

/// DELETE /api/v1/sales/{id}
///
/// Returns the sold quantity to the product's stock.
pub async fn delete(
    State(state): State<AppState>,
    owner: SessionOwner,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let permit =
        MutationPermit::enter(&state, ResourceKind::Transaction, &id, &owner.owner_id).await?;

    if !SaleRepo::delete(&state.pool, &id).await? {
        return Err(AppError::not_found("Transaction", id));
    }

    permit.finish_delete();
    tracing::info!(transaction_id = %id, owner_id = %owner.owner_id, "Sale deleted");
    Ok(StatusCode::NO_CONTENT)
}
