//! Captured request/response exchanges

use std::collections::HashMap;

use serde_json::Value;

use crate::error::HarnessResult;

/// The request half of an exchange, as the application sent it.
#[derive(Debug, Clone)]
pub struct RequestData {
    pub method: String,
    /// Path and query as requested
    pub uri: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RequestData {
    /// Parse the request body as JSON.
    pub fn body_json(&self) -> HarnessResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// The response half of an exchange, as delivered to the application.
#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ResponseData {
    /// Parse the response body as JSON.
    pub fn body_json(&self) -> HarnessResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Replace the body with the serialized form of a JSON value.
    pub fn set_body_json(&mut self, value: &Value) {
        self.body = value.to_string();
    }
}

/// A completed exchange recorded by the proxy. The request is captured
/// before any transform runs, the response after; read-only once created.
#[derive(Debug, Clone)]
pub struct RecordedExchange {
    pub alias: Option<String>,
    pub request: RequestData,
    pub response: ResponseData,
}
