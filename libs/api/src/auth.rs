use axum::{
    extract::{Request, State},
    http,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ApiError, ApiState};

/// Bearer token claims. `sub` identifies the caller's user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub async fn auth(
    State(state): State<ApiState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    let Some(auth_header) = auth_header else {
        return Err(ApiError::AuthError(
            "Authorization header is missing".to_string(),
        ));
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return Err(ApiError::AuthError("Invalid token".to_string()));
    };

    let claims =
        decode::<Claims>(token, &state.decoding_key, &Validation::default())
            .map_err(|e| {
                debug!(task = "auth", error = e.to_string());
                ApiError::AuthError("Invalid token".to_string())
            })?
            .claims;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;

    use crate::test_util::{request, send, setup, token};

    #[tokio::test]
    async fn test_auth_requires_bearer_scheme() {
        let (app, _, _dir) = setup().await;

        for header in [token("alice"), format!("Basic {}", token("alice"))] {
            let mut req = request("GET", "/user", None);
            req.headers_mut()
                .insert("Authorization", header.parse().unwrap());

            let (status, body) = send(&app, req).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["message"], "Invalid token");
        }
    }

    #[tokio::test]
    async fn test_auth_accepts_bearer_token() {
        let (app, _, _dir) = setup().await;

        let (status, _) = send(&app, request("GET", "/user", Some("alice"))).await;

        assert_eq!(status, StatusCode::OK);
    }
}
