use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "compound-cards",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": (Utc::now() - state.started_at).num_seconds(),
        "rooms": state.sessions.room_count(),
        "connections": state.sessions.connection_count(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::{app, config::Config, AppState};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_health_reports_sessions() {
        let state = Arc::new(AppState::with_builtin_table(Config::default()));
        let (tx, _rx) = mpsc::channel(8);
        state
            .sessions
            .join(Uuid::new_v4(), "Alice", None, tx)
            .unwrap();

        let response = app(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "compound-cards");
        assert_eq!(json["rooms"], 1);
        assert_eq!(json["connections"], 1);
    }
}
