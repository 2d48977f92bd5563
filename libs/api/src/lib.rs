use std::path::PathBuf;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use jsonwebtoken::DecodingKey;
use repository::Repository;
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;

use crate::thumbnail::ThumbnailStore;

mod auth;
pub mod healthz;
pub mod not_found;
pub mod post;
mod response;
pub mod thumbnail;
pub mod user;

#[cfg(test)]
mod test_util;

pub use auth::Claims;

#[derive(Debug, PartialEq)]
pub enum ApiError {
    AuthError(String),
    Forbidden(String),
    NotFound(String),
    ClientError(String),
    ValidationError(String),
    PayloadTooLarge(String),
    ServerError(String),
}

#[derive(Clone)]
pub struct ApiState {
    repo: Repository,
    thumbnails: ThumbnailStore,
    decoding_key: DecodingKey,
    config: Config,
}

impl ApiState {
    pub fn new(repo: Repository, config: Config, jwt_secret: &str) -> Self {
        Self {
            repo,
            thumbnails: ThumbnailStore::new(config.thumbnail.dir.clone()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            config,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub server: Server,
    pub cors: Cors,
    pub thumbnail: Thumbnail,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Thumbnail {
    pub dir: PathBuf,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_max_bytes() -> usize {
    2_000_000
}

// Room for the text fields and multipart framing around a maximal thumbnail.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        post::get_posts,
        post::get_post,
        post::get_category_posts,
        post::get_user_posts,
        post::create_post,
        post::edit_post,
        post::delete_post,
        user::get_user,
    ),
    components(schemas(
        post::request::PostForm,
        post::response::PostResp,
        user::response::UserResp,
    )),
    tags(
        (name = "posts", description = "Blog posts management API")
    )
)]
struct ApiDoc;

pub async fn serve(
    repository: Repository,
    config_name: &str,
    jwt_secret: &str,
) -> anyhow::Result<Router> {
    info!(task = "start api serving");

    let config: Config = util::load_config(config_name)?;

    router(ApiState::new(repository, config, jwt_secret))
}

pub fn router(state: ApiState) -> anyhow::Result<Router> {
    let origins = state
        .config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid cors origin: {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let auth = middleware::from_fn_with_state(state.clone(), auth::auth);

    // posts
    let post_router = Router::new()
        .route(
            "/",
            post(post::create_post)
                .route_layer(auth.clone())
                .get(post::get_posts),
        )
        .route(
            "/:id",
            patch(post::edit_post)
                .delete(post::delete_post)
                .route_layer(auth.clone())
                .get(post::get_post),
        )
        .route("/categories/:category", get(post::get_category_posts))
        .route("/users/:id", get(post::get_user_posts))
        .with_state(state.clone());

    // user
    let user_router = Router::new()
        .route("/", get(user::get_user))
        .route_layer(auth)
        .with_state(state.clone());

    let body_limit = state.config.thumbnail.max_bytes + FORM_OVERHEAD_BYTES;

    let router = Router::new()
        .route("/healthz", get(healthz::get_health))
        .route("/api-docs/openapi.json", get(openapi))
        .with_state(state.clone())
        .nest("/posts", post_router)
        .nest("/user", user_router)
        .nest_service("/uploads", ServeDir::new(state.thumbnails.dir()))
        .fallback(not_found::get_404)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
