use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::models::{HistoryEntry, SensorSnapshot};
use crate::state::SharedState;

#[derive(Clone)]
struct ApiState {
    sensor: SharedState,
    page: Arc<str>,
}

pub fn router(sensor: SharedState, page: String) -> Router {
    let state = ApiState {
        sensor,
        page: page.into(),
    };

    Router::new()
        .route("/", get(index))
        .route("/api/sensor-data", get(sensor_data))
        .route("/api/history", get(history))
        .with_state(state)
}

pub async fn serve(config: &ServerConfig, sensor: SharedState, page: String) -> Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&address)
        .await
        .context(format!("Failed to bind {}", address))?;

    info!("Dashboard listening on http://{}", address);

    axum::serve(listener, router(sensor, page))
        .await
        .context("HTTP server failed")
}

async fn index(State(state): State<ApiState>) -> Html<String> {
    Html(state.page.to_string())
}

async fn sensor_data(State(state): State<ApiState>) -> Json<SensorSnapshot> {
    Json(state.sensor.snapshot().await)
}

async fn history(State(state): State<ApiState>) -> Json<Vec<HistoryEntry>> {
    Json(state.sensor.history().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Measurement, MoistureStatus, ReadingSource};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn measurement(minute: i64, voltage: f64, moisture: f64) -> Measurement {
        let taken_at = Utc.with_ymd_and_hms(2024, 7, 1, 17, 0, 0).unwrap() + Duration::minutes(minute);
        Measurement {
            voltage,
            moisture_percentage: moisture,
            status: MoistureStatus::from_percentage(moisture),
            source: ReadingSource::Sensor,
            taken_at: taken_at.with_timezone(&chrono_tz::US::Central),
        }
    }

    async fn get_json(app: Router, uri: &str) -> Value {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_sensor_data_before_first_reading() {
        let app = router(SharedState::new(30), String::new());

        let body = get_json(app, "/api/sensor-data").await;

        assert_eq!(
            body,
            json!({
                "voltage": 0.0,
                "moisture_percentage": 0.0,
                "status": "Dry",
                "last_updated": null,
                "source": null,
            })
        );
    }

    #[tokio::test]
    async fn test_sensor_data_after_reading() {
        let state = SharedState::new(30);
        state.record(&measurement(0, 2.25, 50.0)).await;
        let app = router(state, String::new());

        let body = get_json(app, "/api/sensor-data").await;

        assert_eq!(body["voltage"], 2.25);
        assert_eq!(body["moisture_percentage"], 50.0);
        assert_eq!(body["status"], "Moist");
        assert_eq!(body["last_updated"], "2024-07-01 12:00:00 CDT");
        assert_eq!(body["source"], "sensor");
    }

    #[tokio::test]
    async fn test_history_is_oldest_first() {
        let state = SharedState::new(2);
        state.record(&measurement(0, 3.0, 0.0)).await;
        state.record(&measurement(1, 2.25, 50.0)).await;
        state.record(&measurement(2, 1.5, 100.0)).await;
        let app = router(state, String::new());

        let body = get_json(app, "/api/history").await;

        assert_eq!(
            body,
            json!([
                { "timestamp": "12:01:00", "moisture": 50.0, "voltage": 2.25 },
                { "timestamp": "12:02:00", "moisture": 100.0, "voltage": 1.5 },
            ])
        );
    }

    #[tokio::test]
    async fn test_index_serves_dashboard() {
        let app = router(SharedState::new(30), "<h1>Soil</h1>".to_string());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Soil</h1>");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let app = router(SharedState::new(30), String::new());

        let response = app
            .oneshot(Request::builder().uri("/api/settings").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_write_methods_are_rejected() {
        let app = router(SharedState::new(30), String::new());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sensor-data")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
