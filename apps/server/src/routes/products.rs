//! Product endpoints.
//!
//! Every successful mutation returns the fresh record and is announced on
//! the [`ChangeFeed`](crate::events::ChangeFeed).

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use stockroom_core::{InventoryStats, NewProduct, Product, ProductFilter, ProductPatch};

use crate::error::{ApiError, ApiResult};
use crate::events::ProductChange;
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/stats", get(stats))
        .route("/categories", get(categories))
        .route("/events", get(events))
        .route("/barcode/{code}", get(get_by_barcode))
        .route(
            "/{id}",
            get(get_product)
                .put(update_product)
                .patch(update_product)
                .delete(delete_product),
        )
}

async fn list_products(
    State(state): State<SharedState>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(filter) = filter?;
    debug!(?filter, "Listing products");
    Ok(Json(state.db.products().list_filtered(&filter).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    q: String,
}

async fn search_products(
    State(state): State<SharedState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(params) = params?;
    Ok(Json(state.db.products().search(&params.q).await?))
}

async fn create_product(
    State(state): State<SharedState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = payload?;
    let product = state.db.products().create(input).await?;

    state.changes.publish(ProductChange::Created {
        product: product.clone(),
    });

    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<SharedState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = id?;
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {id}")))
}

async fn get_by_barcode(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_barcode(&code)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No product with barcode {code}")))
}

async fn update_product(
    State(state): State<SharedState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    let product = state.db.products().update(id, patch).await?;

    state.changes.publish(ProductChange::Updated {
        product: product.clone(),
    });

    Ok(Json(product))
}

/// Always 204; deleting a missing product is a no-op.
async fn delete_product(
    State(state): State<SharedState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    if state.db.products().delete(id).await? {
        state.changes.publish(ProductChange::Deleted { id });
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn stats(State(state): State<SharedState>) -> ApiResult<Json<InventoryStats>> {
    let products = state.db.products().list().await?;
    Ok(Json(InventoryStats::compute(&products)))
}

async fn categories(State(state): State<SharedState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.products().categories().await?))
}

async fn events(State(state): State<SharedState>) -> impl IntoResponse {
    state.changes.sse()
}
