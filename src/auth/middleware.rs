use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use entity::user;

use crate::db::queries;
use crate::error::AppError;

/// The caller of the current request, resolved from a Bearer token to a
/// stored user. Handlers receive it as an argument instead of reaching for
/// any process-wide auth state.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync + AsRef<crate::AppState>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state: &crate::AppState = state.as_ref();

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let claims = app_state.jwt.verify_access_token(token)?;

        let user = queries::users::find_by_id(&app_state.db, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_banned() {
            tracing::debug!(user_id = %user.id, "Rejected request from banned user");
            return Err(AppError::UserBanned);
        }

        Ok(CurrentUser(user))
    }
}

/// Admin auth: requires a Bearer token of a user with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync + AsRef<crate::AppState>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }

        Ok(AdminUser(user))
    }
}
