use axum::{extract::State, http::HeaderMap};
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::verify_jwt;
use crate::error::ApiError;
use crate::middleware::{extract_jwt_from_headers, ApiResponse, ApiResult};
use crate::state::AppState;

const BAD_REQUEST: &str = "bad request";

/// GET /current-user - Resolve the user behind the bearer token
///
/// Every failure (missing header, bad signature, expired token, unknown
/// user, store error) answers 400 `{result: "failure", message: "bad request"}`.
pub async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let token = extract_jwt_from_headers(&headers).map_err(|msg| {
        debug!("current-user rejected: {}", msg);
        ApiError::failure(BAD_REQUEST)
    })?;

    let claims = verify_jwt(token, &state.security.jwt_secret).map_err(|e| {
        debug!("current-user rejected: {}", e);
        ApiError::failure(BAD_REQUEST)
    })?;

    let user = match state.store.find_user(claims.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!("current-user rejected: user {} not found", claims.user_id);
            return Err(ApiError::failure(BAD_REQUEST));
        }
        Err(e) => {
            tracing::warn!("current-user lookup failed: {}", e);
            return Err(ApiError::failure(BAD_REQUEST));
        }
    };

    Ok(ApiResponse::ok(json!({ "user": user })))
}
