use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use shared_models::auth::{AuthUser, Role};
use shared_models::error::AppError;
use shared_store::AppContext;

use crate::services::token::TokenAuthority;

/// The access gate every operation passes through: a pure delegation to the
/// token authority plus the role-equality check. No state, no side effects.
pub fn authorize(authority: &TokenAuthority, token: &str, required_role: Role) -> bool {
    authorize_subject(authority, token, required_role).is_some()
}

/// Like `authorize`, but hands back the token subject on success so callers
/// can resolve "the current patient" without re-deriving the role.
pub fn authorize_subject(
    authority: &TokenAuthority,
    token: &str,
    required_role: Role,
) -> Option<String> {
    match authority.decode(token) {
        Ok(claims) if claims.role == required_role => Some(claims.sub),
        Ok(claims) => {
            debug!(
                "Role mismatch: token carries {}, operation requires {}",
                claims.role, required_role
            );
            None
        }
        Err(err) => {
            debug!("Authorization failed: {}", err);
            None
        }
    }
}

fn bearer_token(request: &Request<Body>) -> Result<&str, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

/// Middleware for authentication: validates the bearer token and parks the
/// caller identity in request extensions. Handlers still check the role the
/// operation requires via `require_role` before touching anything.
pub async fn auth_middleware(
    State(ctx): State<Arc<AppContext>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;

    let authority = TokenAuthority::new(&ctx.config);
    let claims = authority
        .decode(token)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    request.extensions_mut().insert(AuthUser {
        subject: claims.sub,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Rejects before any side effect when the caller's role does not match the
/// one the operation requires.
pub fn require_role(user: &AuthUser, required: Role) -> Result<(), AppError> {
    if user.role != required {
        return Err(AppError::Auth(format!(
            "Operation requires {} role",
            required
        )));
    }
    Ok(())
}
