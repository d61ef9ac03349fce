// src/api/types.rs
use actix_web::{http::StatusCode, HttpResponse};
use serde_json::{json, Value};

use crate::utils::error::AggregatorError;

/// RPC envelope returned by orchestrator entry points: an HTTP-style
/// status code plus a JSON body.
#[derive(Debug, Clone)]
pub struct RpcResponse {
    pub status_code: StatusCode,
    pub body: Value,
}

impl RpcResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status_code: StatusCode::OK,
            body,
        }
    }

    pub fn from_error(error: &AggregatorError) -> Self {
        Self {
            status_code: error.status_code(),
            body: json!({
                "error": {
                    "code": error.status_code().as_u16(),
                    "message": error.to_string(),
                }
            }),
        }
    }

    pub fn into_http_response(self) -> HttpResponse {
        HttpResponse::build(self.status_code).json(self.body)
    }
}
