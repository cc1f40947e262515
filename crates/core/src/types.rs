//! Event model consumed by vendor adapters — page and track calls from the
//! host analytics runtime, plus the order line items a track call may carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Free-form event properties, as received from the host runtime.
pub type Properties = HashMap<String, serde_json::Value>;

/// A named behavioral event ("signup", "Order Completed", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEvent {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
    pub timestamp: DateTime<Utc>,
}

impl TrackEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            properties: Properties::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// A page view from the host runtime. Name and properties are carried for
/// parity with the host API; adapters that only fire a fixed page pixel
/// ignore them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEvent {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    pub timestamp: DateTime<Utc>,
}

impl PageEvent {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            properties: Properties::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

impl Default for PageEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// A single order line item inside `properties["products"]`. Fields beyond
/// price and quantity are ignored for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
}

fn default_quantity() -> f64 {
    1.0
}

/// Read a JSON value as a number the lenient way analytics payloads expect:
/// native numbers pass through, numeric strings parse, everything else is
/// not a number.
pub fn numeric(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
