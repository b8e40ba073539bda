use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Successful response: the payload's fields merged with a `result`
/// discriminator, e.g. `{"result": "ok", "branch": {...}}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub result: &'static str,
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// `result: "ok"` with default 200 status
    pub fn ok(data: T) -> Self {
        Self {
            result: "ok",
            data,
            status_code: None,
        }
    }

    /// 201 Created with `result: "ok"`
    pub fn created(data: T) -> Self {
        Self {
            result: "ok",
            data,
            status_code: Some(StatusCode::CREATED),
        }
    }

    /// 200 with a non-default discriminator such as `"no more branches"`
    pub fn with_result(result: &'static str, data: T) -> Self {
        Self {
            result,
            data,
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

impl ApiResponse<()> {
    /// Bare `{"result": "ok"}`
    pub fn empty() -> Self {
        Self::ok(())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let mut envelope = match serde_json::to_value(&self.data) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "result": "error",
                        "message": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };
        envelope.insert("result".to_string(), Value::String(self.result.to_string()));

        (status, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
