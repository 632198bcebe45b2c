use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::{DetectError, DetectionClient, Prediction, WirePrediction};

/// Talks to the inference service over HTTP: one multipart POST carrying
/// the raw image, expecting a JSON prediction back. The whole exchange is
/// bounded by the configured timeout; there is no retry.
pub struct HttpDetectionClient {
    http: reqwest::Client,
    url: String,
}

impl HttpDetectionClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn detect(&self, image: Bytes, filename: &str) -> Result<Prediction, DetectError> {
        let part = Part::bytes(image.to_vec()).file_name(filename.to_string());
        let form = Form::new().part("image", part);

        let response = self.http.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DetectError::Status(status));
        }

        let wire: WirePrediction = response
            .json()
            .await
            .map_err(|e| DetectError::Malformed(e.to_string()))?;
        let prediction = Prediction::from_wire(wire)?;
        debug!(
            total_calories = prediction.total_calories,
            items = prediction.items.len(),
            "detection completed"
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::json;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/detect")
    }

    fn jpeg() -> Bytes {
        Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3])
    }

    #[tokio::test]
    async fn round_trips_a_prediction() {
        let router = Router::new().route(
            "/detect",
            post(|| async {
                Json(json!({
                    "total_calorie": 550.0,
                    "items": [
                        {"name": "Rice", "confidence": 0.92,
                         "boxX1": 0, "boxY1": 0, "boxX2": 10, "boxY2": 10}
                    ]
                }))
            }),
        );
        let url = spawn(router).await;

        let client = HttpDetectionClient::new(url, Duration::from_secs(5)).unwrap();
        let prediction = client.detect(jpeg(), "meal.jpg").await.unwrap();
        assert_eq!(prediction.total_calories, 550.0);
        assert_eq!(prediction.items[0].label.as_deref(), Some("Rice"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/detect",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let url = spawn(router).await;

        let client = HttpDetectionClient::new(url, Duration::from_secs(5)).unwrap();
        let err = client.detect(jpeg(), "meal.jpg").await.unwrap_err();
        assert!(matches!(err, DetectError::Status(s) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn garbled_body_is_malformed() {
        let router = Router::new().route("/detect", post(|| async { "not json at all" }));
        let url = spawn(router).await;

        let client = HttpDetectionClient::new(url, Duration::from_secs(5)).unwrap();
        let err = client.detect(jpeg(), "meal.jpg").await.unwrap_err();
        assert!(matches!(err, DetectError::Malformed(_)));
    }

    #[tokio::test]
    async fn slow_service_hits_the_deadline() {
        let router = Router::new().route(
            "/detect",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({"total_calorie": 1, "items": []}))
            }),
        );
        let url = spawn(router).await;

        let client = HttpDetectionClient::new(url, Duration::from_millis(200)).unwrap();
        let err = client.detect(jpeg(), "meal.jpg").await.unwrap_err();
        assert!(matches!(err, DetectError::Transport(e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        // Port 9 (discard) is a safe dead end.
        let client =
            HttpDetectionClient::new("http://127.0.0.1:9/detect", Duration::from_millis(500))
                .unwrap();
        let err = client.detect(jpeg(), "meal.jpg").await.unwrap_err();
        assert!(matches!(err, DetectError::Transport(_)));
    }
}
