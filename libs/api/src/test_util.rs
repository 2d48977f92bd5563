use axum::{
    body::{Body, Bytes},
    http::{Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{auth::Claims, router, ApiState, Config, Cors, Server, Thumbnail};

pub const SECRET: &str = "test-secret";
pub const MAX_BYTES: usize = 1024;
const BOUNDARY: &str = "X-BLOG-BOUNDARY";

pub async fn setup() -> (Router, ApiState, TempDir) {
    let repo = repository::init_in_memory().await.unwrap();
    let dir = tempfile::tempdir().unwrap();

    let config = Config {
        server: Server { port: 0 },
        cors: Cors {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        thumbnail: Thumbnail {
            dir: dir.path().join("uploads"),
            max_bytes: MAX_BYTES,
        },
    };

    let state = ApiState::new(repo, config, SECRET);
    let app = router(state.clone()).unwrap();

    (app, state, dir)
}

pub fn token(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: 4_102_444_800,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart(
    method: &str,
    uri: &str,
    sub: Option<&str>,
    parts: &[Part],
) -> Request<Body> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                    )
                    .as_bytes(),
                );
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        "Content-Type",
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(sub) = sub {
        builder =
            builder.header("Authorization", format!("Bearer {}", token(sub)));
    }

    builder.body(Body::from(body)).unwrap()
}

pub fn request(method: &str, uri: &str, sub: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(sub) = sub {
        builder =
            builder.header("Authorization", format!("Bearer {}", token(sub)));
    }

    builder.body(Body::empty()).unwrap()
}

/// Runs one request through the router. Empty bodies come back as `Null`.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, req).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

pub async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, bytes)
}
