//! Liveness and database health.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::warn;

use stockroom_db::migrations::migration_status;

use crate::state::SharedState;

pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let database = state.db.health_check().await;

    let migrations = match migration_status(state.db.pool()).await {
        Ok((total, applied)) => json!({ "applied": applied, "total": total }),
        Err(e) => {
            warn!(error = %e, "Migration status unavailable");
            serde_json::Value::Null
        }
    };

    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "database": database,
            "migrations": migrations,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[cfg(test)]
mod tests {
    use crate::config::StockroomConfig;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use stockroom_db::{Database, DbConfig};
    use tower::ServiceExt;

    async fn get_health(db: Database) -> (StatusCode, Value) {
        let app = crate::routes::router(AppState::new(db, StockroomConfig::default()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_healthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (status, body) = get_health(db).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
        assert_eq!(body["migrations"]["applied"], body["migrations"]["total"]);
    }

    #[tokio::test]
    async fn test_closed_pool_is_degraded() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        let (status, body) = get_health(db).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["migrations"], Value::Null);
    }
}
