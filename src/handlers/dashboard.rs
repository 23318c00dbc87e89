use axum::{extract::State, response::Response};

use crate::auth::middleware::CurrentUser;
use crate::db::queries;
use crate::error::AppError;
use crate::flash::Flash;
use crate::view::View;
use crate::AppState;

/// How many recent users and applications the admin dashboard lists.
const RECENT: u64 = 10;

pub async fn index(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    flash: Flash,
) -> Result<Response, AppError> {
    if !user.is_admin() {
        return View::new("dashboard.user")
            .with("user", &user)
            .render(&flash)
            .await;
    }

    let users = queries::users::latest(&state.db, RECENT).await?;
    let applications = queries::applications::latest(&state.db, RECENT).await?;

    View::new("dashboard.admin")
        .with("user", &user)
        .with("users", &users)
        .with("applications", &applications)
        .render(&flash)
        .await
}
