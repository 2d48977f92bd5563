use anyhow::anyhow;
use axum::{extract::State, Extension, Json};
use entity::prelude::*;
use tracing::info;

use crate::{
    auth::Claims,
    response::{ApiResponse, IntoApiResponse},
    ApiState,
};

use self::response::UserResp;
pub mod response;

/// Get the calling user
#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "Get user successfully", body = UserResp),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn get_user(
    Extension(claims): Extension<Claims>,
    State(state): State<ApiState>,
) -> ApiResponse<Json<UserResp>> {
    let user = find_or_create(&state, &claims.sub).await?;

    Ok(Json(UserResp::from(user)))
}

/// Looks the caller up by token subject, registering them on first sight.
pub(crate) async fn find_or_create(
    state: &ApiState,
    sub: &str,
) -> ApiResponse<UserEntity> {
    let user = state
        .repo
        .user
        .find_by_sub(sub)
        .await
        .into_response("500-011")?;

    if let Some(user) = user {
        return Ok(user);
    }

    let saved = state
        .repo
        .user
        .save(UserEntity {
            sub: sub.to_string(),
            ..Default::default()
        })
        .await;

    let id = match saved {
        Ok(id) => id,
        Err(e) => {
            // a concurrent first request for the same sub won the insert
            let user = state
                .repo
                .user
                .find_by_sub(sub)
                .await
                .into_response("500-011")?;

            return match user {
                Some(user) => Ok(user),
                None => Err(e).into_response("500-011"),
            };
        }
    };

    info!(task = "register user", id);

    let user = state.repo.user.find_by_id(id).await;

    let Ok(Some(user)) = user else {
        return Err(anyhow!("failed to get user. id: {}", id))
            .into_response("500-011");
    };

    Ok(user)
}
