use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::Settings;
use crate::error::TrackingError;

/// Client for the EPS tracking API.
///
/// Holds a `reqwest::Client` bounded by the configured timeout plus the
/// credentials injected at construction. Cloning is cheap; the underlying
/// connection pool is shared.
#[derive(Clone)]
pub struct EpsClient {
    http: reqwest::Client,
    settings: Arc<Settings>,
}

impl EpsClient {
    /// Build a client from settings. The timeout is baked into the underlying
    /// HTTP client, so every upstream call is bounded. Redirects are not
    /// followed; a 3xx classifies like any other non-success status.
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build EPS HTTP client")?;

        Ok(Self { http, settings })
    }

    /// Look up tracking details for an AWB number.
    ///
    /// Issues exactly one upstream GET and classifies the outcome:
    /// timeout, non-success status, missing tracking data, or any other
    /// failure, in that order. On success the parsed upstream body is
    /// returned untouched.
    pub async fn fetch_tracking(&self, awb: &str) -> Result<Value, TrackingError> {
        let params = [
            ("Token", self.settings.token.as_str()),
            ("UserID", self.settings.user_id.as_str()),
            ("Password", self.settings.password.as_str()),
            ("AwbNo", awb),
            ("Type", "json"),
        ];

        let response = match self
            .http
            .get(&self.settings.base_url)
            .query(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::error!("Timeout calling EPS for AWB={}", awb);
                return Err(TrackingError::Timeout);
            }
            Err(e) => {
                tracing::error!("Unexpected error calling EPS for AWB={}: {}", awb, e);
                return Err(TrackingError::Internal);
            }
        };

        let status = response.status();
        tracing::info!("EPS responded {} for AWB={}", status.as_u16(), awb);

        if !status.is_success() {
            tracing::error!("EPS HTTP error status={} AWB={}", status.as_u16(), awb);
            return Err(TrackingError::Upstream);
        }

        // The timeout also covers reading the body, so a stalled response can
        // still surface here as a timeout.
        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) if e.is_timeout() => {
                tracing::error!("Timeout calling EPS for AWB={}", awb);
                return Err(TrackingError::Timeout);
            }
            Err(e) => {
                tracing::error!("Failed to parse EPS response for AWB={}: {}", awb, e);
                return Err(TrackingError::Internal);
            }
        };

        if !data.is_object() {
            tracing::error!("Unexpected EPS response shape for AWB={}", awb);
            return Err(TrackingError::Internal);
        }

        if !has_tracking_detail(&data) {
            tracing::warn!("No tracking found for AWB={}", awb);
            return Err(TrackingError::NotFound);
        }

        Ok(data)
    }
}

/// True when the body carries a non-empty `TrackDetail` field.
///
/// The upstream reports "no data" in several shapes: a missing key, `null`,
/// an empty array or string. All of those count as empty, as do `false`, `0`
/// and `{}`.
fn has_tracking_detail(data: &Value) -> bool {
    match data.get("TrackDetail") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::{Json, Router, extract::Query, http::{StatusCode, header}, routing::get};
    use serde_json::json;

    /// Bind a stub upstream on an ephemeral port and serve it in the
    /// background for the duration of the test.
    async fn spawn_upstream(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr, timeout: Duration) -> EpsClient {
        let settings = Arc::new(Settings {
            token: "tok".to_string(),
            user_id: "uid".to_string(),
            password: "pwd".to_string(),
            base_url: format!("http://{}/api/Client/TrackingDetail", addr),
            request_timeout: timeout,
            ..Settings::default()
        });
        EpsClient::new(settings).unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_payload_unchanged() {
        let body = json!({
            "TrackDetail": [{"status": "delivered"}],
            "Courier": "EPS",
        });
        let response = body.clone();
        let app = Router::new().route(
            "/api/Client/TrackingDetail",
            get(move || async move { Json(response) }),
        );
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_secs(2));
        let data = client.fetch_tracking("AWB123").await.unwrap();
        assert_eq!(data, body);
    }

    #[tokio::test]
    async fn fetch_sends_credentials_and_awb_as_query_params() {
        let app = Router::new().route(
            "/api/Client/TrackingDetail",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({ "TrackDetail": [1], "query": params }))
            }),
        );
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_secs(2));
        let data = client.fetch_tracking("AWB123").await.unwrap();

        let query = &data["query"];
        assert_eq!(query["Token"], "tok");
        assert_eq!(query["UserID"], "uid");
        assert_eq!(query["Password"], "pwd");
        assert_eq!(query["AwbNo"], "AWB123");
        assert_eq!(query["Type"], "json");
    }

    #[tokio::test]
    async fn fetch_classifies_empty_tracking_as_not_found() {
        let app = Router::new().route(
            "/api/Client/TrackingDetail",
            get(|| async { Json(json!({ "TrackDetail": [] })) }),
        );
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.fetch_tracking("AWB999").await.unwrap_err();
        assert_eq!(err, TrackingError::NotFound);
    }

    #[tokio::test]
    async fn fetch_classifies_missing_tracking_field_as_not_found() {
        let app = Router::new().route(
            "/api/Client/TrackingDetail",
            get(|| async { Json(json!({ "Courier": "EPS" })) }),
        );
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.fetch_tracking("AWB999").await.unwrap_err();
        assert_eq!(err, TrackingError::NotFound);
    }

    #[tokio::test]
    async fn fetch_classifies_non_success_status_as_upstream_error() {
        // Body content must not matter, and an upstream 404 is still a 502
        // for the caller.
        let app = Router::new().route(
            "/api/Client/TrackingDetail",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "TrackDetail": [{"status": "delivered"}] })),
                )
            }),
        );
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.fetch_tracking("AWB123").await.unwrap_err();
        assert_eq!(err, TrackingError::Upstream);
    }

    #[tokio::test]
    async fn fetch_classifies_server_error_status_as_upstream_error() {
        let app = Router::new().route(
            "/api/Client/TrackingDetail",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.fetch_tracking("AWB123").await.unwrap_err();
        assert_eq!(err, TrackingError::Upstream);
    }

    #[tokio::test]
    async fn fetch_classifies_redirect_as_upstream_error() {
        // Redirects are not followed, even when the target would answer with
        // valid tracking data.
        let app = Router::new()
            .route(
                "/api/Client/TrackingDetail",
                get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/found")]) }),
            )
            .route(
                "/found",
                get(|| async { Json(json!({ "TrackDetail": [{"status": "delivered"}] })) }),
            );
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.fetch_tracking("AWB123").await.unwrap_err();
        assert_eq!(err, TrackingError::Upstream);
    }

    #[tokio::test]
    async fn fetch_classifies_slow_upstream_as_timeout() {
        let app = Router::new().route(
            "/api/Client/TrackingDetail",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "TrackDetail": [1] }))
            }),
        );
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_millis(250));
        let err = client.fetch_tracking("AWB123").await.unwrap_err();
        assert_eq!(err, TrackingError::Timeout);
    }

    #[tokio::test]
    async fn fetch_classifies_connection_failure_as_internal() {
        // Bind to grab a free port, then drop the listener so nothing accepts.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.fetch_tracking("AWB123").await.unwrap_err();
        assert_eq!(err, TrackingError::Internal);
    }

    #[tokio::test]
    async fn fetch_classifies_malformed_body_as_internal() {
        let app = Router::new().route("/api/Client/TrackingDetail", get(|| async { "not json" }));
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.fetch_tracking("AWB123").await.unwrap_err();
        assert_eq!(err, TrackingError::Internal);
    }

    #[tokio::test]
    async fn fetch_classifies_non_object_body_as_internal() {
        let app = Router::new().route(
            "/api/Client/TrackingDetail",
            get(|| async { Json(json!([1, 2, 3])) }),
        );
        let addr = spawn_upstream(app).await;

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.fetch_tracking("AWB123").await.unwrap_err();
        assert_eq!(err, TrackingError::Internal);
    }

    #[test]
    fn has_tracking_detail_requires_a_non_empty_value() {
        for empty in [
            json!({}),
            json!({ "TrackDetail": null }),
            json!({ "TrackDetail": [] }),
            json!({ "TrackDetail": "" }),
            json!({ "TrackDetail": {} }),
            json!({ "TrackDetail": false }),
            json!({ "TrackDetail": 0 }),
        ] {
            assert!(!has_tracking_detail(&empty), "expected empty: {}", empty);
        }

        for present in [
            json!({ "TrackDetail": [{"status": "delivered"}] }),
            json!({ "TrackDetail": "in transit" }),
            json!({ "TrackDetail": {"status": "delivered"} }),
            json!({ "TrackDetail": 1 }),
            json!({ "TrackDetail": true }),
        ] {
            assert!(has_tracking_detail(&present), "expected data: {}", present);
        }
    }
}
