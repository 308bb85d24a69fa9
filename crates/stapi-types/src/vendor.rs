//! Planet tasking REST API wire format (`/tasking/v2`).

use crate::{Geometry, JsonObject};
use serde::{Deserialize, Serialize};

pub const JOB_STATUS_DONE: &str = "DONE";
pub const JOB_STATUS_FAILED: &str = "FAILED";

/// Imaging-window search submitted as an asynchronous job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagingWindowSearch {
    /// `"<start>/<end>"` ISO interval.
    pub datetime: String,
    pub pl_number: String,
    pub product: String,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudForecast {
    #[serde(default)]
    pub prediction: Option<f64>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// One imaging window returned by a finished search job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagingWindow {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub off_nadir_angle_min: f64,
    pub off_nadir_angle_max: f64,
    pub satellite_type: String,
    #[serde(default)]
    pub cloud_forecast: Vec<CloudForecast>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Body of a search-job poll response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusBody {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imaging_windows: Option<Vec<ImagingWindow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<serde_json::Value>,
}

/// Classified job status; non-terminal states are not distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState<'a> {
    Done,
    Failed,
    Pending(&'a str),
}

impl JobStatusBody {
    pub fn state(&self) -> JobState<'_> {
        match self.status.as_str() {
            JOB_STATUS_DONE => JobState::Done,
            JOB_STATUS_FAILED => JobState::Failed,
            other => JobState::Pending(other),
        }
    }

    pub fn error_code_text(&self) -> String {
        json_text(self.error_code.as_ref())
    }

    pub fn error_message_text(&self) -> String {
        json_text(self.error_message.as_ref())
    }
}

fn json_text(v: Option<&serde_json::Value>) -> String {
    match v {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Tasking order as returned by `GET /orders/{id}` and `POST /orders/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetOrder {
    pub id: String,
    pub geometry: Geometry,
    pub original_geometry: Geometry,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub imaging_window: Option<serde_json::Value>,
    pub created_time: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub pl_number: String,
    pub product: String,
    pub imaging_window: String,
    pub geometry: Geometry,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetProduct {
    pub pl_number: String,
    pub product: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// `GET /products` answers either with a bare list or an envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductsResponse {
    List(Vec<PlanetProduct>),
    Envelope { products: Vec<PlanetProduct> },
}

impl ProductsResponse {
    pub fn into_products(self) -> Vec<PlanetProduct> {
        match self {
            ProductsResponse::List(p) | ProductsResponse::Envelope { products: p } => p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_classification() {
        let body: JobStatusBody = serde_json::from_str(r#"{"status": "RUNNING"}"#).unwrap();
        assert_eq!(body.state(), JobState::Pending("RUNNING"));
        let body: JobStatusBody = serde_json::from_str(
            r#"{"status": "FAILED", "error_code": "X", "error_message": "Y"}"#,
        )
        .unwrap();
        assert_eq!(body.state(), JobState::Failed);
        assert_eq!(body.error_code_text(), "X");
        assert_eq!(body.error_message_text(), "Y");
    }

    #[test]
    fn numeric_error_code_renders_as_text() {
        let body: JobStatusBody =
            serde_json::from_str(r#"{"status": "FAILED", "error_code": 42}"#).unwrap();
        assert_eq!(body.error_code_text(), "42");
        assert_eq!(body.error_message_text(), "");
    }

    #[test]
    fn products_response_accepts_both_shapes() {
        let list: ProductsResponse =
            serde_json::from_str(r#"[{"pl_number": "PL-1", "product": "Flexible"}]"#).unwrap();
        assert_eq!(list.into_products()[0].product, "Flexible");
        let env: ProductsResponse = serde_json::from_str(
            r#"{"products": [{"pl_number": "PL-1", "product": "Assured", "tier": 2}]}"#,
        )
        .unwrap();
        let products = env.into_products();
        assert_eq!(products[0].pl_number, "PL-1");
        assert_eq!(products[0].extra["tier"], 2);
    }
}
