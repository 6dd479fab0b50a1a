use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use jobsift_core::traits::{JobStore, RunStore, ScrapeProvider};

use crate::dto::ErrorResponse;
use crate::state::AppState;

/// JWT claims carried by a caller's bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (owner_id as string).
    pub sub: String,
    pub owner_id: Uuid,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// Creates and verifies JWT bearer tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    /// Issue a token for an owner. Expires after 24 hours.
    pub fn create_token(&self, owner_id: Uuid) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(24);

        let claims = Claims {
            sub: owner_id.to_string(),
            owner_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a token. Returns claims if valid and not expired.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

/// Verified caller identity, inserted into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub owner_id: Uuid,
}

/// Middleware that validates `Authorization: Bearer <jwt>` and makes the
/// caller's owner id available to handlers.
pub async fn require_auth<P, R, J>(
    State(state): State<Arc<AppState<P, R, J>>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let claims = token.and_then(|t| state.jwt.verify_token(t).ok());

    match claims {
        Some(claims) => {
            request.extensions_mut().insert(CurrentUser {
                owner_id: claims.owner_id,
            });
            next.run(request).await
        }
        None => {
            let body = ErrorResponse {
                error: "unauthorized".to_string(),
                message: "Missing or invalid Authorization header. Expected: Bearer <token>"
                    .to_string(),
            };
            (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
        }
    }
}
