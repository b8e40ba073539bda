use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::branch_service::BranchError;
use crate::state::AppState;

use super::utils::parse_id;

/// GET /branches/:branch_id - Get a single branch by ID
///
/// An unknown id is answered with 400 `{result: "failure"}`.
pub async fn show(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
) -> ApiResult<Value> {
    let branch_id = parse_id(&branch_id, "branch_id")?;

    match state.branches.get_branch(branch_id).await {
        Ok(branch) => Ok(ApiResponse::ok(json!({ "branch": branch }))),
        Err(BranchError::BranchNotFound(_)) => Err(ApiError::failure("branch does not exist")),
        Err(other) => Err(other.into()),
    }
}
