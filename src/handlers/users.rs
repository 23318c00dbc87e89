use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use entity::user::{self, Status};
use sea_orm::ModelTrait;

use crate::auth::middleware::AdminUser;
use crate::db::queries;
use crate::error::AppError;
use crate::flash::Flash;
use crate::pagination::PageQuery;
use crate::view::{back, View};
use crate::AppState;

const INDEX: &str = "/users";

pub async fn index(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let users = queries::users::list_members(&state.db, query.page()).await?;

    View::new("user.index")
        .with("users", &users)
        .render(&flash)
        .await
}

pub async fn ban(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    set_status(&state, &admin, &flash, &id, Status::Banned).await?;
    Ok(back(&headers, INDEX))
}

pub async fn unban(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    set_status(&state, &admin, &flash, &id, Status::Active).await?;
    Ok(back(&headers, INDEX))
}

pub async fn destroy(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let target = queries::users::find_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    match target.delete(&state.db).await {
        Ok(_) => {
            tracing::info!(user_id = %id, admin_id = %admin.id, "User deleted");
            flash.success("User is successfully deleted.").await?;
        }
        Err(e) => {
            tracing::error!(user_id = %id, "Failed to delete user: {e}");
            flash.error("Error occured to delete the user.").await?;
        }
    }

    Ok(back(&headers, INDEX))
}

async fn set_status(
    state: &AppState,
    admin: &user::Model,
    flash: &Flash,
    id: &str,
    status: Status,
) -> Result<(), AppError> {
    let target = queries::users::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let (done, failed) = match status {
        Status::Banned => (
            "User is successfully banned.",
            "Error occured to ban the user.",
        ),
        Status::Active => (
            "User is successfully unbanned.",
            "Error occured to unban the user.",
        ),
    };

    match queries::users::set_status(&state.db, target, status).await {
        Ok(_) => {
            tracing::info!(user_id = %id, admin_id = %admin.id, ?status, "User status changed");
            flash.success(done).await?;
        }
        Err(e) => {
            tracing::error!(user_id = %id, "Failed to change user status: {e}");
            flash.error(failed).await?;
        }
    }

    Ok(())
}
