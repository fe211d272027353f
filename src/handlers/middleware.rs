use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use http::{header, HeaderMap, StatusCode};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

use crate::{
    models::{error::Error, jwt::Claims},
    utils::{config::JwkComponents, state::AppState},
};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn verify(token: &str, jwk: &JwkComponents) -> Result<Claims, Error> {
    let decoding_key = DecodingKey::from_ec_components(&jwk.x, &jwk.y).map_err(|e| {
        Error::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Invalid JWK: {}", e),
        )
    })?;

    let mut validation = Validation::new(Algorithm::ES256);
    validation.set_audience(&["authenticated"]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            Error::new(
                StatusCode::UNAUTHORIZED,
                &format!("Token validation failed: {}", e),
            )
        })
}

/// Guards the prediction routes with an ES256 bearer token when a JWK is
/// configured. Verified claims are attached to the request.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, Error> {
    let Some(jwk) = state.config.jwk.as_ref() else {
        return Ok(next.run(req).await);
    };

    let token = bearer_token(req.headers())
        .ok_or((StatusCode::UNAUTHORIZED, "Missing Bearer token"))?;
    let claims = verify(token, jwk)?;
    tracing::debug!("authenticated {}", claims.sub);

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
