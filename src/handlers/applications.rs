use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Form,
};
use entity::application;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::CurrentUser;
use crate::auth::policy::{ApplicationOp, Scope};
use crate::db::queries;
use crate::error::AppError;
use crate::flash::Flash;
use crate::services::analytics::HitsQuery;
use crate::validation::{self, ValidationErrors};
use crate::view::{back, redirect, View};
use crate::AppState;

const INDEX: &str = "/applications";

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub app_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApplicationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub app_type: String,
}

impl ApplicationForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        validation::required(&mut errors, "name", &self.name);
        validation::max_len(&mut errors, "name", &self.name, 255);
        validation::max_len(&mut errors, "description", &self.description, 2000);
        validation::required(&mut errors, "type", &self.app_type);
        validation::max_len(&mut errors, "type", &self.app_type, 64);
        errors.into_result()
    }
}

// --- Handlers ---

pub async fn index(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    flash: Flash,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let scope = ApplicationOp::List
        .scope(&user)
        .ok_or(AppError::Forbidden)?;

    if user.is_admin() {
        let applications =
            queries::applications::list(&state.db, &scope, query.app_type.as_deref()).await?;

        return View::new("app.admin-index")
            .with("applications", &applications)
            .with("type", &query.app_type)
            .render(&flash)
            .await;
    }

    let applications = queries::applications::list(&state.db, &scope, None).await?;

    View::new("app.user-index")
        .with("applications", &applications)
        .render(&flash)
        .await
}

pub async fn show(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let scope = ApplicationOp::Show
        .scope(&user)
        .ok_or(AppError::Forbidden)?;

    let application = queries::applications::find_in_scope(&state.db, &id, &scope)
        .await?
        .ok_or(AppError::ApplicationNotFound)?;

    let total_users = queries::tokens::count_for_app(&state.db, &application.id).await?;

    let analytic = match &application.key {
        Some(key) => state.analytics.total_hits(&HitsQuery::for_key(key)).await?,
        None => serde_json::Value::Null,
    };

    View::new("app.single")
        .with("application", &application)
        .with("total_users", total_users)
        .with("analytic", &analytic)
        .render(&flash)
        .await
}

pub async fn create(CurrentUser(user): CurrentUser, flash: Flash) -> Result<Response, AppError> {
    if ApplicationOp::Create.scope(&user).is_none() {
        flash.error("Admin cannot create new application.").await?;
        return Ok(redirect(INDEX));
    }

    View::new("app.form").render(&flash).await
}

pub async fn store(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Form(form): Form<ApplicationForm>,
) -> Result<Response, AppError> {
    if ApplicationOp::Create.scope(&user).is_none() {
        flash.error("Admin cannot create new application.").await?;
        return Ok(redirect(INDEX));
    }

    if let Err(errors) = form.validate() {
        return invalid_form(None, &form, errors, &flash).await;
    }

    // The key needs the stored row; both writes commit together.
    let txn = state.db.begin().await?;

    let app = match queries::applications::insert(
        &txn,
        &user.id,
        &form.name,
        &form.description,
        &form.app_type,
    )
    .await
    {
        Ok(app) => app,
        Err(e) => {
            tracing::warn!(owner_id = %user.id, "Failed to save application: {e}");
            txn.rollback().await?;
            flash.keep_input(&form).await?;
            flash.error("Error occured to create application.").await?;
            return Ok(back(&headers, "/applications/create"));
        }
    };

    let key = state.keygen.generate(&user, &app);
    let app_id = app.id.clone();

    if let Err(e) = queries::applications::assign_key(&txn, app, key).await {
        tracing::warn!(owner_id = %user.id, app_id = %app_id, "Failed to assign application key: {e}");
        txn.rollback().await?;
        flash.keep_input(&form).await?;
        flash
            .error("Error occured to generate the application key.")
            .await?;
        return Ok(back(&headers, "/applications/create"));
    }

    txn.commit().await?;
    tracing::info!(owner_id = %user.id, app_id = %app_id, "Application created");

    flash.success("Application is successfully created.").await?;
    Ok(redirect(INDEX))
}

pub async fn edit(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let scope = ApplicationOp::Edit
        .scope(&user)
        .ok_or(AppError::Forbidden)?;

    let Some(model) = queries::applications::find_in_scope(&state.db, &id, &scope).await? else {
        flash.error("Sorry, you cannot edit the application.").await?;
        return Ok(redirect(INDEX));
    };

    View::new("app.form")
        .with("model", &model)
        .render(&flash)
        .await
}

pub async fn update(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ApplicationForm>,
) -> Result<Response, AppError> {
    let scope = ApplicationOp::Update
        .scope(&user)
        .ok_or(AppError::Forbidden)?;

    let Some(app) = queries::applications::find_in_scope(&state.db, &id, &scope).await? else {
        flash.error("Sorry, you cannot update the application.").await?;
        return Ok(redirect(INDEX));
    };

    if let Err(errors) = form.validate() {
        return invalid_form(Some(&app), &form, errors, &flash).await;
    }

    let mut active: application::ActiveModel = app.into();
    active.name = Set(form.name.clone());
    active.description = Set(form.description.clone());
    active.app_type = Set(form.app_type.clone());
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&state.db).await {
        Ok(_) => {
            flash.success("Application is successfully updated.").await?;
            Ok(redirect(INDEX))
        }
        Err(e) => {
            tracing::warn!(app_id = %id, "Failed to update application: {e}");
            flash.keep_input(&form).await?;
            flash
                .error("Error occured to update your application.")
                .await?;
            Ok(back(&headers, INDEX))
        }
    }
}

pub async fn destroy(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let scope = ApplicationOp::Delete
        .scope(&user)
        .ok_or(AppError::Forbidden)?;

    match delete_with_tokens(&state.db, &id, &scope, &user.id).await {
        Ok(true) => {
            tracing::info!(app_id = %id, user_id = %user.id, "Application deleted");
            flash.success("Application is successfully deleted.").await?;
        }
        Ok(false) => {
            flash.error("Sorry, you cannot delete the application.").await?;
        }
        Err(e) => {
            tracing::error!(app_id = %id, "Failed to delete application: {e}");
            flash.error("Error occured to delete application.").await?;
        }
    }

    Ok(back(&headers, INDEX))
}

pub async fn disable(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    toggle(&state, &user, &flash, &id, ApplicationOp::Disable).await?;
    Ok(back(&headers, INDEX))
}

pub async fn enable(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    toggle(&state, &user, &flash, &id, ApplicationOp::Enable).await?;
    Ok(back(&headers, INDEX))
}

// --- Helpers ---

async fn invalid_form(
    model: Option<&application::Model>,
    form: &ApplicationForm,
    errors: ValidationErrors,
    flash: &Flash,
) -> Result<Response, AppError> {
    View::new("app.form")
        .status(StatusCode::UNPROCESSABLE_ENTITY)
        .with("model", model)
        .with("input", form)
        .with("errors", &errors)
        .render(flash)
        .await
}

/// Removes the application and the caller's tokens for it. Returns false
/// when the application is not in `scope`, in which case nothing changes.
async fn delete_with_tokens(
    db: &DatabaseConnection,
    id: &str,
    scope: &Scope,
    user_id: &str,
) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    if queries::applications::delete_in_scope(&txn, id, scope).await? == 0 {
        txn.rollback().await?;
        return Ok(false);
    }
    queries::tokens::delete_for_app_and_user(&txn, id, user_id).await?;

    txn.commit().await?;
    Ok(true)
}

async fn toggle(
    state: &AppState,
    user: &entity::user::Model,
    flash: &Flash,
    id: &str,
    op: ApplicationOp,
) -> Result<(), AppError> {
    let scope = op.scope(user).ok_or(AppError::Forbidden)?;
    let disabled = op == ApplicationOp::Disable;

    let app = queries::applications::find_in_scope(&state.db, id, &scope)
        .await?
        .ok_or(AppError::ApplicationNotFound)?;

    match set_disabled_with_tokens(&state.db, app, disabled).await {
        Ok(tokens) => {
            tracing::info!(app_id = %id, disabled, tokens, "Application state changed");
            if disabled {
                flash.success("Application is successfully disabled.").await?;
            } else {
                flash.success("Application is successfully enabled.").await?;
            }
        }
        Err(e) => {
            tracing::error!(app_id = %id, disabled, "Failed to change application state: {e}");
            if disabled {
                flash.error("Error occured to disable application.").await?;
            } else {
                flash.error("Error occured to enable application.").await?;
            }
        }
    }

    Ok(())
}

async fn set_disabled_with_tokens(
    db: &DatabaseConnection,
    app: application::Model,
    disabled: bool,
) -> Result<u64, DbErr> {
    let txn = db.begin().await?;
    let app_id = app.id.clone();

    queries::applications::set_disabled(&txn, app, disabled).await?;
    let tokens = queries::tokens::set_disabled_for_app(&txn, &app_id, disabled).await?;

    txn.commit().await?;
    Ok(tokens)
}
