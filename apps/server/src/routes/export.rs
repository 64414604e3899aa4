//! Export downloads.
//!
//! Takes the same filter parameters as the product list, so a client can
//! export exactly what it is showing.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use tracing::info;

use stockroom_core::{Product, ProductFilter};
use stockroom_export::{file_name, render, ExportFormat};

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/xlsx", get(export_xlsx))
        .route("/sql", get(export_sql))
}

async fn export_xlsx(
    State(state): State<SharedState>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(filter) = filter?;
    download(state, filter, ExportFormat::Xlsx).await
}

async fn export_sql(
    State(state): State<SharedState>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(filter) = filter?;
    download(state, filter, ExportFormat::Sql).await
}

async fn download(
    state: SharedState,
    filter: ProductFilter,
    format: ExportFormat,
) -> ApiResult<impl IntoResponse> {
    let products = state.db.products().list_filtered(&filter).await?;
    let options = state.config.export.clone();
    let now = Utc::now();
    let name = file_name(&options, now, format);

    // Workbook compression is CPU-bound.
    let bytes = tokio::task::spawn_blocking(move || {
        let refs: Vec<&Product> = products.iter().collect();
        render(format, &refs, &options, now)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Export task failed: {e}")))??;

    info!(%format, file = %name, "Export downloaded");

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    ))
}
