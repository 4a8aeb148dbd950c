//! Uniform response envelope
//!
//! Every body the service returns, success or failure, is an
//! [`ApiResponse`]. The request correlation id is read from the task-local
//! set by [`crate::middleware::request_context`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

tokio::task_local! {
    /// Correlation id of the request being served
    pub static REQUEST_ID: String;
}

/// Correlation id of the current request, if called inside one
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub request_id: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn new(status: StatusCode, data: Option<T>, message: &str) -> Self {
        Self {
            status: status.as_u16(),
            data,
            errors: None,
            message: message.to_string(),
            timestamp: Utc::now(),
            request_id: current_request_id(),
        }
    }

    /// 200 with data
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, Some(data), "Success")
    }

    /// 200 with data and a custom message
    pub fn ok_with_message(data: T, message: &str) -> Self {
        Self::new(StatusCode::OK, Some(data), message)
    }

    /// 201 with data
    pub fn created(data: T) -> Self {
        Self::new(StatusCode::CREATED, Some(data), "Created")
    }
}

impl ApiResponse<()> {
    /// Failure body carrying the error list
    pub fn failure(status: StatusCode, message: &str) -> Self {
        Self {
            status: status.as_u16(),
            data: None,
            errors: Some(vec![message.to_string()]),
            message: message.to_string(),
            timestamp: Utc::now(),
            request_id: current_request_id(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(body["status"], 200);
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert_eq!(body["message"], "Success");
        assert!(body.get("errors").is_none());
        assert!(body["request_id"].is_null());
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_failure_envelope_shape() {
        let body =
            serde_json::to_value(ApiResponse::failure(StatusCode::FORBIDDEN, "Insufficient permissions"))
                .unwrap();
        assert_eq!(body["status"], 403);
        assert!(body.get("data").is_none());
        assert_eq!(body["errors"], serde_json::json!(["Insufficient permissions"]));
    }

    #[tokio::test]
    async fn test_request_id_is_picked_up_inside_scope() {
        let body = REQUEST_ID
            .scope("req-42".to_string(), async {
                serde_json::to_value(ApiResponse::created("x")).unwrap()
            })
            .await;
        assert_eq!(body["request_id"], "req-42");
        assert_eq!(body["status"], 201);
    }
}
