//! Standardized tasking API (STAPI) request and response shapes.

use crate::{DatetimeInterval, JsonObject};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

pub const CORE: &str = "https://stapi.example.com/v0.1.0/core";
pub const OPPORTUNITIES: &str = "https://stapi.example.com/v0.1.0/opportunities";

pub const TYPE_JSON: &str = "application/json";
pub const TYPE_GEOJSON: &str = "application/geo+json";

/// GeoJSON geometry; coordinates are kept as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
}

impl Geometry {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: serde_json::json!([longitude, latitude]),
            bbox: None,
        }
    }

    /// Same geometry with `bbox` dropped.
    pub fn without_bbox(&self) -> Self {
        Self {
            bbox: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Link {
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            media_type: Some(TYPE_JSON.to_string()),
            title: None,
            method: None,
            body: None,
        }
    }
}

/// Find the first link with the given relation.
pub fn find_link<'a>(links: &'a [Link], rel: &str) -> Option<&'a Link> {
    links.iter().find(|l| l.rel == rel)
}

/// Opportunity search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityPayload {
    pub datetime: DatetimeInterval,
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityProperties<P = JsonObject> {
    pub product_id: String,
    pub datetime: DatetimeInterval,
    #[serde(flatten)]
    pub extra: P,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity<P = JsonObject> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    pub properties: OpportunityProperties<P>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl<P: Serialize> Opportunity<P> {
    /// Erase the product-specific properties type.
    pub fn into_json(self) -> Result<Opportunity, serde_json::Error> {
        let extra = match serde_json::to_value(&self.properties.extra)? {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => JsonObject::new(),
            other => {
                let mut map = JsonObject::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Ok(Opportunity {
            id: self.id,
            kind: self.kind,
            geometry: self.geometry,
            properties: OpportunityProperties {
                product_id: self.properties.product_id,
                datetime: self.properties.datetime,
                extra,
            },
            links: self.links,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityCollection<P = JsonObject> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Opportunity<P>>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl<P> OpportunityCollection<P> {
    pub fn new(features: Vec<Opportunity<P>>) -> Self {
        Self {
            id: None,
            kind: "FeatureCollection".to_string(),
            features,
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunitySearchStatusCode {
    Received,
    InProgress,
    Failed,
    Canceled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySearchStatus {
    pub timestamp: DateTime<Utc>,
    pub status_code: OpportunitySearchStatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_text: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Record of one opportunity search, kept by the opportunity store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySearchRecord {
    pub id: String,
    pub product_id: String,
    pub opportunity_request: OpportunityPayload,
    pub status: OpportunitySearchStatus,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySearchRecords {
    pub search_records: Vec<OpportunitySearchRecord>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload<P = JsonObject> {
    pub datetime: DatetimeInterval,
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    pub order_parameters: P,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusCode {
    Received,
    Accepted,
    Rejected,
    Completed,
    Canceled,
    Scheduled,
    Held,
    Processing,
    Reserved,
    Tasked,
    UserCanceled,
    Expired,
    Failed,
}

impl OrderStatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatusCode::Received => "received",
            OrderStatusCode::Accepted => "accepted",
            OrderStatusCode::Rejected => "rejected",
            OrderStatusCode::Completed => "completed",
            OrderStatusCode::Canceled => "canceled",
            OrderStatusCode::Scheduled => "scheduled",
            OrderStatusCode::Held => "held",
            OrderStatusCode::Processing => "processing",
            OrderStatusCode::Reserved => "reserved",
            OrderStatusCode::Tasked => "tasked",
            OrderStatusCode::UserCanceled => "user_canceled",
            OrderStatusCode::Expired => "expired",
            OrderStatusCode::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub timestamp: DateTime<Utc>,
    pub status_code: OrderStatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_text: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl OrderStatus {
    pub fn now(status_code: OrderStatusCode) -> Self {
        Self {
            timestamp: Utc::now(),
            status_code,
            reason_code: None,
            reason_text: None,
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatuses {
    pub statuses: Vec<OrderStatus>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSearchParameters {
    pub datetime: DatetimeInterval,
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderProperties {
    pub product_id: String,
    pub created: DateTime<FixedOffset>,
    pub status: OrderStatus,
    pub search_parameters: OrderSearchParameters,
    pub opportunity_properties: JsonObject,
    pub order_parameters: JsonObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    pub properties: OrderProperties,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Order>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    Licensor,
    Producer,
    Processor,
    Host,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub roles: Vec<ProviderRole>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "conformsTo", default)]
    pub conforms_to: Vec<String>,
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub license: String,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub products: Vec<Product>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conformance {
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
}

/// Landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootResponse {
    pub id: String,
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
    pub links: Vec<Link>,
}

/// Error body returned by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetail {
    pub detail: String,
}
