use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::services::branch_service::BranchPage;
use crate::state::AppState;

use super::utils::{parse_id, PageQuery};

/// GET /users/:user_id/branches - Owned and shared branches, newest first
///
/// Either `{result: "ok", data: [{email, branch}]}` or, once `skip` runs
/// past the end, `{result: "no more branches", message}`.
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let page = query.resolve(&state.pagination)?;

    let response = match state.branches.list_branches(user_id, page).await? {
        BranchPage::Entries(data) => ApiResponse::ok(json!({ "data": data })).into_response(),
        BranchPage::Exhausted => ApiResponse::with_result(
            "no more branches",
            json!({ "message": "this is the last branch" }),
        )
        .into_response(),
    };

    Ok(response)
}

/// GET /users/:user_id/branches/private - Owned branches that are not shared
pub async fn list_private(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let page = query.resolve(&state.pagination)?;

    let data = state.branches.list_private_branches(user_id, page).await?;

    Ok(ApiResponse::ok(json!({ "data": data })).into_response())
}
