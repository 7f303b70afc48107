use axum::extract::FromRequestParts;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{error::AppError, models::Role};

pub const SESSION_USER_ID_KEY: &str = "user_id";
pub const SESSION_ROLE_KEY: &str = "role";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_organizer(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_organizer() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Owner-or-admin rule used by event and booking mutations.
pub fn ensure_owner_or_admin(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if user.user_id != owner_id && !user.role.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Record the authenticated identity on the server-side session. The cookie
/// only ever carries the opaque session id.
pub async fn establish_session(session: &Session, user_id: Uuid, role: Role) -> Result<(), AppError> {
    session
        .insert(SESSION_USER_ID_KEY, user_id)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    session
        .insert(SESSION_ROLE_KEY, role)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    Ok(())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthenticated)?;

        let user_id: Uuid = session
            .get(SESSION_USER_ID_KEY)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
            .ok_or(AppError::Unauthenticated)?;

        let role: Role = session
            .get(SESSION_ROLE_KEY)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
            .ok_or(AppError::Unauthenticated)?;

        Ok(AuthUser { user_id, role })
    }
}
