use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod http;

pub use http::HttpDetectionClient;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("detection request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("detection service answered {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed detection response: {0}")]
    Malformed(String),
}

/// Axis-aligned rectangle in image pixel coordinates, encoded as two
/// corner points with `(x1, y1)` top-left and `(x2, y2)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedItem {
    /// None when the detector could not classify the object.
    pub label: Option<String>,
    pub confidence: f64,
    pub bounds: BoundingBox,
}

/// A validated prediction. Construction goes through [`Prediction::from_wire`],
/// so downstream code never sees negative calories, out-of-range confidences
/// or inverted boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub total_calories: f64,
    pub items: Vec<DetectedItem>,
}

/// Raw response shape of the detection service. Field names follow its
/// wire protocol; unknown or missing required fields fail deserialization.
#[derive(Debug, Deserialize)]
pub struct WirePrediction {
    pub total_calorie: f64,
    pub items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
pub struct WireItem {
    pub name: Option<String>,
    pub confidence: f64,
    #[serde(rename = "boxX1")]
    pub box_x1: f64,
    #[serde(rename = "boxY1")]
    pub box_y1: f64,
    #[serde(rename = "boxX2")]
    pub box_x2: f64,
    #[serde(rename = "boxY2")]
    pub box_y2: f64,
}

impl Prediction {
    pub fn from_wire(wire: WirePrediction) -> Result<Self, DetectError> {
        if !wire.total_calorie.is_finite() || wire.total_calorie < 0.0 {
            return Err(DetectError::Malformed(format!(
                "total_calorie out of range: {}",
                wire.total_calorie
            )));
        }
        let mut items = Vec::with_capacity(wire.items.len());
        for (idx, item) in wire.items.into_iter().enumerate() {
            if !(0.0..=1.0).contains(&item.confidence) {
                return Err(DetectError::Malformed(format!(
                    "item {idx}: confidence out of range: {}",
                    item.confidence
                )));
            }
            let bounds = BoundingBox {
                x1: item.box_x1,
                y1: item.box_y1,
                x2: item.box_x2,
                y2: item.box_y2,
            };
            let coords = [bounds.x1, bounds.y1, bounds.x2, bounds.y2];
            if coords.iter().any(|c| !c.is_finite() || *c < 0.0)
                || bounds.x2 < bounds.x1
                || bounds.y2 < bounds.y1
            {
                return Err(DetectError::Malformed(format!(
                    "item {idx}: invalid bounding box {bounds:?}"
                )));
            }
            items.push(DetectedItem {
                label: item.name,
                confidence: item.confidence,
                bounds,
            });
        }
        Ok(Self {
            total_calories: wire.total_calorie,
            items,
        })
    }
}

/// Boundary to the external inference service. One synchronous call per
/// image; no retries. Any transport failure, non-2xx status or unparseable
/// body surfaces as a [`DetectError`] so the caller never interprets
/// partial prediction data.
#[async_trait]
pub trait DetectionClient: Send + Sync {
    async fn detect(&self, image: Bytes, filename: &str) -> Result<Prediction, DetectError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Prediction, DetectError> {
        let wire: WirePrediction = serde_json::from_str(json)
            .map_err(|e| DetectError::Malformed(e.to_string()))?;
        Prediction::from_wire(wire)
    }

    #[test]
    fn parses_a_full_prediction() {
        let p = parse(
            r#"{
                "total_calorie": 550.0,
                "items": [
                    {"name": "Rice", "confidence": 0.92,
                     "boxX1": 0, "boxY1": 0, "boxX2": 10, "boxY2": 10},
                    {"name": null, "confidence": 0.4,
                     "boxX1": 5, "boxY1": 5, "boxX2": 8, "boxY2": 8}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(p.total_calories, 550.0);
        assert_eq!(p.items.len(), 2);
        assert_eq!(p.items[0].label.as_deref(), Some("Rice"));
        assert!(p.items[1].label.is_none());
        assert_eq!(p.items[1].bounds.x2, 8.0);
    }

    #[test]
    fn empty_item_list_is_legal() {
        let p = parse(r#"{"total_calorie": 0, "items": []}"#).unwrap();
        assert!(p.items.is_empty());
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        assert!(matches!(
            parse(r#"{"items": []}"#),
            Err(DetectError::Malformed(_))
        ));
        assert!(matches!(
            parse(r#"{"total_calorie": 100, "items": [{"name": "Rice"}]}"#),
            Err(DetectError::Malformed(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_malformed() {
        assert!(matches!(
            parse(r#"{"total_calorie": -5, "items": []}"#),
            Err(DetectError::Malformed(_))
        ));
        assert!(matches!(
            parse(
                r#"{"total_calorie": 10, "items": [
                    {"name": "Rice", "confidence": 1.5,
                     "boxX1": 0, "boxY1": 0, "boxX2": 1, "boxY2": 1}]}"#
            ),
            Err(DetectError::Malformed(_))
        ));
    }

    #[test]
    fn inverted_or_negative_boxes_are_malformed() {
        assert!(matches!(
            parse(
                r#"{"total_calorie": 10, "items": [
                    {"name": "Rice", "confidence": 0.5,
                     "boxX1": 9, "boxY1": 0, "boxX2": 1, "boxY2": 1}]}"#
            ),
            Err(DetectError::Malformed(_))
        ));
        assert!(matches!(
            parse(
                r#"{"total_calorie": 10, "items": [
                    {"name": "Rice", "confidence": 0.5,
                     "boxX1": -1, "boxY1": 0, "boxX2": 1, "boxY2": 1}]}"#
            ),
            Err(DetectError::Malformed(_))
        ));
    }
}
