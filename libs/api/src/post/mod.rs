use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use entity::prelude::*;
use tracing::{info, warn};

pub mod request;
pub mod response;

use crate::{
    auth::Claims,
    response::{ApiResponse, IntoApiResponse},
    user, ApiError, ApiState,
};

use self::{
    request::{PostForm, Upload},
    response::PostResp,
};

/// List all posts, most recently updated first
#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    responses(
        (status = 200, description = "List all posts successfully", body = [PostResp])
    )
)]
pub async fn get_posts(
    State(state): State<ApiState>,
) -> ApiResponse<Json<Vec<PostResp>>> {
    let posts = state.repo.post.find_all().await.into_response("500-001")?;

    Ok(Json(posts.into_iter().map(PostResp::from).collect()))
}

/// Get a post
#[utoipa::path(
    get,
    path = "/posts/{id}",
    tag = "posts",
    responses(
        (status = 200, description = "Get post successfully", body = PostResp),
        (status = 404, description = "Post not found")
    ),
    params(
        ("id" = i32, Path, description = "post id"),
    )
)]
pub async fn get_post(
    State(state): State<ApiState>,
    Path(id): Path<i32>,
) -> ApiResponse<Json<PostResp>> {
    let post = state
        .repo
        .post
        .find_by_id(id)
        .await
        .into_response("500-002")?;

    let Some(post) = post else {
        return Err(ApiError::NotFound("Post not found.".to_string()));
    };

    Ok(Json(PostResp::from(post)))
}

/// List posts of a category, newest first
#[utoipa::path(
    get,
    path = "/posts/categories/{category}",
    tag = "posts",
    responses(
        (status = 200, description = "List category posts successfully", body = [PostResp])
    ),
    params(
        ("category" = String, Path, description = "category label, e.g. Agriculture"),
    )
)]
pub async fn get_category_posts(
    State(state): State<ApiState>,
    Path(category): Path<String>,
) -> ApiResponse<Json<Vec<PostResp>>> {
    // no post can carry an unknown label
    let Ok(category) = category.parse::<Category>() else {
        return Ok(Json(vec![]));
    };

    let posts = state
        .repo
        .post
        .find_by_category(category)
        .await
        .into_response("500-003")?;

    Ok(Json(posts.into_iter().map(PostResp::from).collect()))
}

/// List posts of a user, newest first
#[utoipa::path(
    get,
    path = "/posts/users/{id}",
    tag = "posts",
    responses(
        (status = 200, description = "List user posts successfully", body = [PostResp])
    ),
    params(
        ("id" = i32, Path, description = "user id"),
    )
)]
pub async fn get_user_posts(
    State(state): State<ApiState>,
    Path(id): Path<i32>,
) -> ApiResponse<Json<Vec<PostResp>>> {
    let posts = state
        .repo
        .post
        .find_by_creator(id)
        .await
        .into_response("500-004")?;

    Ok(Json(posts.into_iter().map(PostResp::from).collect()))
}

/// Create a post
#[utoipa::path(
    post,
    path = "/posts",
    tag = "posts",
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Create post successfully", body = PostResp),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 422, description = "Missing field, unknown category or thumbnail too big")
    )
)]
pub async fn create_post(
    State(state): State<ApiState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResponse<(StatusCode, Json<PostResp>)> {
    let new_post = PostForm::from_multipart(multipart).await?.into_new_post()?;

    check_thumbnail_size(
        &state,
        &new_post.thumbnail,
        "Thumbnail too big. File size should be less than 2mb",
    )?;

    let user = user::find_or_create(&state, &claims.sub).await?;

    let file_name = state
        .thumbnails
        .save(&new_post.thumbnail.file_name, &new_post.thumbnail.bytes)
        .await
        .into_response("500-008")?;

    let post = state
        .repo
        .post
        .create(PostEntity {
            title: new_post.title,
            category: new_post.category,
            description: new_post.description,
            thumbnail: file_name.clone(),
            creator_id: user.id,
            ..Default::default()
        })
        .await;

    let post = match post {
        Ok(post) => post,
        Err(e) => {
            discard_thumbnail(&state, &file_name).await;
            return Err(e).into_response("500-005");
        }
    };

    state
        .repo
        .user
        .increment_posts(user.id)
        .await
        .into_response("500-012")?;

    info!(task = "create post", id = post.id, creator = user.id);

    Ok((StatusCode::CREATED, Json(PostResp::from(post))))
}

/// Edit a post, optionally replacing its thumbnail
#[utoipa::path(
    patch,
    path = "/posts/{id}",
    tag = "posts",
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Edit post successfully", body = PostResp),
        (status = 400, description = "Could not update post"),
        (status = 403, description = "Caller is not the creator"),
        (status = 404, description = "Post not found"),
        (status = 422, description = "Invalid field or thumbnail too big")
    ),
    params(
        ("id" = i32, Path, description = "post id"),
    )
)]
pub async fn edit_post(
    State(state): State<ApiState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> ApiResponse<Json<PostResp>> {
    let edit = PostForm::from_multipart(multipart).await?.into_post_edit()?;

    let post = state
        .repo
        .post
        .find_by_id(id)
        .await
        .into_response("500-002")?;

    let Some(post) = post else {
        return Err(ApiError::NotFound("Post not found".to_string()));
    };

    let user = state
        .repo
        .user
        .find_by_sub(&claims.sub)
        .await
        .into_response("500-011")?;

    if user.map(|user| user.id) != Some(post.creator_id) {
        return Err(ApiError::Forbidden(
            "Unauthorized for this post.".to_string(),
        ));
    }

    let new_thumbnail = match edit.thumbnail {
        Some(upload) => {
            check_thumbnail_size(&state, &upload, "Thumbnail too big")?;

            let file_name = state
                .thumbnails
                .save(&upload.file_name, &upload.bytes)
                .await
                .into_response("500-009")?;

            Some(file_name)
        }
        None => None,
    };

    let updated = state
        .repo
        .post
        .update(PostEntity {
            title: edit.title,
            category: edit.category,
            description: edit.description,
            thumbnail: new_thumbnail
                .clone()
                .unwrap_or_else(|| post.thumbnail.clone()),
            ..post.clone()
        })
        .await;

    match updated {
        Ok(Some(updated)) => {
            if new_thumbnail.is_some() {
                discard_thumbnail(&state, &post.thumbnail).await;
            }

            info!(task = "edit post", id);

            Ok(Json(PostResp::from(updated)))
        }
        Ok(None) => {
            if let Some(file_name) = &new_thumbnail {
                discard_thumbnail(&state, file_name).await;
            }

            Err(ApiError::ClientError("Could not update post".to_string()))
        }
        Err(e) => {
            if let Some(file_name) = &new_thumbnail {
                discard_thumbnail(&state, file_name).await;
            }

            Err(e).into_response("500-006")
        }
    }
}

/// Delete a post and its thumbnail
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = "posts",
    responses(
        (status = 200, description = "Delete post successfully", body = String),
        (status = 403, description = "Caller is not the creator"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Thumbnail could not be removed")
    ),
    params(
        ("id" = i32, Path, description = "post id"),
    )
)]
pub async fn delete_post(
    State(state): State<ApiState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResponse<Json<String>> {
    let post = state
        .repo
        .post
        .find_by_id(id)
        .await
        .into_response("500-002")?;

    let Some(post) = post else {
        return Err(ApiError::NotFound("Post not found.".to_string()));
    };

    let user = state
        .repo
        .user
        .find_by_sub(&claims.sub)
        .await
        .into_response("500-011")?;

    let Some(user) = user.filter(|user| user.id == post.creator_id) else {
        return Err(ApiError::Forbidden("Couldn't delete post.".to_string()));
    };

    // set the file aside so a failed row delete can put it back
    let trashed = format!("{}.deleting", post.thumbnail);
    state
        .thumbnails
        .rename(&post.thumbnail, &trashed)
        .await
        .into_response("500-010")?;

    let deleted = state.repo.post.delete(id).await;

    if !matches!(deleted, Ok(true)) {
        if let Err(e) = state.thumbnails.rename(&trashed, &post.thumbnail).await
        {
            warn!(
                task = "restore thumbnail",
                file_name = post.thumbnail.as_str(),
                error = format!("{:?}", e)
            );
        }
    }

    match deleted {
        Ok(true) => discard_thumbnail(&state, &trashed).await,
        Ok(false) => {
            return Err(ApiError::NotFound("Post not found.".to_string()))
        }
        Err(e) => return Err(e).into_response("500-007"),
    }

    state
        .repo
        .user
        .decrement_posts(user.id)
        .await
        .into_response("500-012")?;

    info!(task = "delete post", id);

    Ok(Json(format!("Post {id} deleted")))
}

fn check_thumbnail_size(
    state: &ApiState,
    upload: &Upload,
    message: &str,
) -> ApiResponse<()> {
    if upload.bytes.len() > state.config.thumbnail.max_bytes {
        return Err(ApiError::ValidationError(message.to_string()));
    }

    Ok(())
}

async fn discard_thumbnail(state: &ApiState, file_name: &str) {
    if let Err(e) = state.thumbnails.remove(file_name).await {
        warn!(
            task = "discard thumbnail",
            file_name,
            error = format!("{:?}", e)
        );
    }
}
