use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::utils::parse_id;

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    #[serde(rename = "sharingInfo")]
    pub sharing_info: SharingInfoPayload,
}

#[derive(Debug, Deserialize)]
pub struct SharingInfoPayload {
    pub email: String,
    /// `"write"` grants write access; anything else is read-only
    pub permission: Option<String>,
}

/// POST /branches/:branch_id/sharing - Share a branch with another user
///
/// Expected Input:
/// ```json
/// { "sharingInfo": { "email": "friend@example.com", "permission": "write" } }
/// ```
///
/// Sharing with the branch author or with someone who already has access
/// answers 200 `{result: "validation err", message}` and creates nothing.
pub async fn share(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
    payload: Result<Json<ShareRequest>, JsonRejection>,
) -> ApiResult<()> {
    let branch_id = parse_id(&branch_id, "branch_id")?;
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let SharingInfoPayload { email, permission } = request.sharing_info;

    state
        .branches
        .share_branch(branch_id, email.trim(), permission.as_deref())
        .await?;

    Ok(ApiResponse::empty())
}
