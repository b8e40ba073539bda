use axum::extract::{Path, State};
use serde::Serialize;

use crate::database::models::{Branch, User};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::utils::parse_id;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBranch {
    pub new_branch: Branch,
    pub updated_user: User,
}

/// POST /users/:user_id/branches - Create an empty branch owned by the user
///
/// Responds 201 `{result: "ok", newBranch, updatedUser}`; the new branch id
/// is the last element of `updatedUser.my_branches`.
pub async fn create(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<CreatedBranch> {
    let user_id = parse_id(&user_id, "user_id")?;
    let (new_branch, updated_user) = state.branches.create_branch(user_id).await?;

    Ok(ApiResponse::created(CreatedBranch {
        new_branch,
        updated_user,
    }))
}
