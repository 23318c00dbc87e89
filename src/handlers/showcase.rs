use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Form,
};
use entity::showcase::{self, Published};
use sea_orm::{ActiveModelTrait, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AdminUser;
use crate::db::queries;
use crate::error::AppError;
use crate::flash::Flash;
use crate::pagination::PageQuery;
use crate::validation::{self, ValidationErrors};
use crate::view::{back, redirect, View};
use crate::AppState;

const INDEX: &str = "/showcase";

// --- Request / Response types ---

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ShowcaseForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub app_type: String,
}

impl ShowcaseForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        validation::required(&mut errors, "name", &self.name);
        validation::max_len(&mut errors, "name", &self.name, 255);
        validation::max_len(&mut errors, "description", &self.description, 5000);
        validation::required(&mut errors, "url", &self.url);
        validation::http_url(&mut errors, "url", &self.url);
        validation::max_len(&mut errors, "url", &self.url, 2048);
        validation::required(&mut errors, "type", &self.app_type);
        validation::max_len(&mut errors, "type", &self.app_type, 64);
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct IconForm {
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScreenshotForm {
    #[serde(default)]
    pub screenshot: String,
}

#[derive(Debug, Serialize)]
pub struct ShowcaseResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub url: String,
    #[serde(rename = "type")]
    pub app_type: String,
    pub icon: Option<String>,
    pub screenshots: Vec<String>,
    pub published: Published,
    pub ready_to_publish: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<showcase::Model> for ShowcaseResponse {
    fn from(model: showcase::Model) -> Self {
        let screenshots = model.screenshot_list();
        let ready_to_publish = model.ready_to_publish();

        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            url: model.url,
            app_type: model.app_type,
            icon: model.icon,
            screenshots,
            published: model.published,
            ready_to_publish,
            created_at: model.created_at.to_string(),
            updated_at: model.updated_at.to_string(),
        }
    }
}

// --- Handlers ---

pub async fn index(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let apps = queries::showcases::list(&state.db, query.page())
        .await?
        .map(ShowcaseResponse::from);

    View::new("showcase.dashboard.index")
        .with("apps", &apps)
        .render(&flash)
        .await
}

pub async fn create(_admin: AdminUser, flash: Flash) -> Result<Response, AppError> {
    View::new("showcase.dashboard.form").render(&flash).await
}

pub async fn store(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Form(form): Form<ShowcaseForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate() {
        return invalid_form(None, &form, errors, &flash).await;
    }

    let slug = queries::showcases::unique_slug(&state.db, &form.name).await?;
    let now = chrono::Utc::now().naive_utc();

    let model = showcase::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(form.name.trim().to_string()),
        slug: Set(slug),
        description: Set(form.description.clone()),
        url: Set(form.url.trim().to_string()),
        app_type: Set(form.app_type.clone()),
        icon: Set(None),
        screenshots: Set("[]".to_string()),
        published: Set(Published::Draft),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match model.insert(&state.db).await {
        Ok(created) => {
            tracing::info!(showcase_id = %created.id, slug = %created.slug, "Showcase created");
            flash.success("Showcase App is successfully created.").await?;
            Ok(redirect(&media_path(&created.id)))
        }
        Err(e) => {
            tracing::warn!("Failed to create showcase: {e}");
            flash.keep_input(&form).await?;
            flash.error("Error occured to create showcase app.").await?;
            Ok(back(&headers, "/showcase/create"))
        }
    }
}

pub async fn edit(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let model = find(&state, &id).await?;

    View::new("showcase.dashboard.form")
        .with("model", ShowcaseResponse::from(model))
        .render(&flash)
        .await
}

pub async fn update(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ShowcaseForm>,
) -> Result<Response, AppError> {
    let model = find(&state, &id).await?;

    if let Err(errors) = form.validate() {
        return invalid_form(Some(model), &form, errors, &flash).await;
    }

    let mut active: showcase::ActiveModel = model.into();
    active.name = Set(form.name.trim().to_string());
    active.description = Set(form.description.clone());
    active.url = Set(form.url.trim().to_string());
    active.app_type = Set(form.app_type.clone());
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&state.db).await {
        Ok(_) => {
            flash.success("Showcase App is successfully edited.").await?;
            Ok(redirect(INDEX))
        }
        Err(e) => {
            tracing::warn!(showcase_id = %id, "Failed to update showcase: {e}");
            flash.keep_input(&form).await?;
            flash.error("Error occured to edit showcase app.").await?;
            Ok(back(&headers, INDEX))
        }
    }
}

pub async fn destroy(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let model = find(&state, &id).await?;

    match model.delete(&state.db).await {
        Ok(_) => {
            tracing::info!(showcase_id = %id, "Showcase deleted");
            flash.success("Showcase App is successfully deleted.").await?;
        }
        Err(e) => {
            tracing::error!(showcase_id = %id, "Failed to delete showcase: {e}");
            flash.error("Error occured to delete the showcase app.").await?;
        }
    }

    Ok(redirect(INDEX))
}

pub async fn publish(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    set_published(&state, &flash, &id, Published::Published).await?;
    Ok(redirect(INDEX))
}

pub async fn draft(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    set_published(&state, &flash, &id, Published::Draft).await?;
    Ok(redirect(INDEX))
}

/// Icon and screenshot step, shown right after a showcase is created.
pub async fn media(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let model = find(&state, &id).await?;

    View::new("showcase.dashboard.icon")
        .with("model", ShowcaseResponse::from(model))
        .render(&flash)
        .await
}

pub async fn set_icon(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Path(id): Path<String>,
    Form(form): Form<IconForm>,
) -> Result<Response, AppError> {
    let model = find(&state, &id).await?;

    let mut errors = ValidationErrors::default();
    validation::required(&mut errors, "icon", &form.icon);
    validation::max_len(&mut errors, "icon", &form.icon, 2048);
    if let Err(errors) = errors.into_result() {
        return invalid_media(model, &form, errors, &flash).await;
    }

    let mut active: showcase::ActiveModel = model.into();
    active.icon = Set(Some(form.icon.trim().to_string()));
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&state.db).await {
        Ok(_) => flash.success("Icon is successfully saved.").await?,
        Err(e) => {
            tracing::warn!(showcase_id = %id, "Failed to save icon: {e}");
            flash.error("Error occured to save the icon.").await?;
        }
    }

    Ok(redirect(&media_path(&id)))
}

pub async fn add_screenshot(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Path(id): Path<String>,
    Form(form): Form<ScreenshotForm>,
) -> Result<Response, AppError> {
    let model = find(&state, &id).await?;

    let mut errors = ValidationErrors::default();
    validation::required(&mut errors, "screenshot", &form.screenshot);
    validation::max_len(&mut errors, "screenshot", &form.screenshot, 2048);
    if let Err(errors) = errors.into_result() {
        return invalid_media(model, &form, errors, &flash).await;
    }

    let mut screenshots = model.screenshot_list();
    screenshots.push(form.screenshot.trim().to_string());

    save_screenshots(&state, &flash, model, &screenshots, "Screenshot is successfully added.")
        .await?;
    Ok(redirect(&media_path(&id)))
}

pub async fn remove_screenshot(
    _admin: AdminUser,
    State(state): State<AppState>,
    flash: Flash,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Response, AppError> {
    let model = find(&state, &id).await?;

    let mut screenshots = model.screenshot_list();
    if index >= screenshots.len() {
        flash.error("Screenshot does not exist.").await?;
        return Ok(redirect(&media_path(&id)));
    }
    screenshots.remove(index);

    save_screenshots(&state, &flash, model, &screenshots, "Screenshot is successfully removed.")
        .await?;
    Ok(redirect(&media_path(&id)))
}

// --- Helpers ---

fn media_path(id: &str) -> String {
    format!("/showcase/{id}/media")
}

async fn find(state: &AppState, id: &str) -> Result<showcase::Model, AppError> {
    queries::showcases::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::ShowcaseNotFound)
}

async fn invalid_form(
    model: Option<showcase::Model>,
    form: &ShowcaseForm,
    errors: ValidationErrors,
    flash: &Flash,
) -> Result<Response, AppError> {
    View::new("showcase.dashboard.form")
        .status(StatusCode::UNPROCESSABLE_ENTITY)
        .with("model", model.map(ShowcaseResponse::from))
        .with("input", form)
        .with("errors", &errors)
        .render(flash)
        .await
}

async fn invalid_media<T: Serialize>(
    model: showcase::Model,
    input: &T,
    errors: ValidationErrors,
    flash: &Flash,
) -> Result<Response, AppError> {
    View::new("showcase.dashboard.icon")
        .status(StatusCode::UNPROCESSABLE_ENTITY)
        .with("model", ShowcaseResponse::from(model))
        .with("input", input)
        .with("errors", &errors)
        .render(flash)
        .await
}

/// Publishing does not check [`showcase::Model::ready_to_publish`]; the
/// list view reports readiness so the admin can decide.
async fn set_published(
    state: &AppState,
    flash: &Flash,
    id: &str,
    published: Published,
) -> Result<(), AppError> {
    let model = find(state, id).await?;

    let mut active: showcase::ActiveModel = model.into();
    active.published = Set(published);
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    let (done, failed) = match published {
        Published::Published => (
            "Showcase App is successfully published.",
            "Error occured to publish the showcase app.",
        ),
        Published::Draft => (
            "Showcase App is successfully draft.",
            "Error occured to draft the showcase app.",
        ),
    };

    match active.update(&state.db).await {
        Ok(_) => flash.success(done).await?,
        Err(e) => {
            tracing::warn!(showcase_id = %id, "Failed to change publish state: {e}");
            flash.error(failed).await?;
        }
    }

    Ok(())
}

async fn save_screenshots(
    state: &AppState,
    flash: &Flash,
    model: showcase::Model,
    screenshots: &[String],
    done: &str,
) -> Result<(), AppError> {
    let id = model.id.clone();
    let encoded = serde_json::to_string(screenshots)
        .map_err(|e| AppError::Internal(format!("Failed to encode screenshots: {e}")))?;

    let mut active: showcase::ActiveModel = model.into();
    active.screenshots = Set(encoded);
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&state.db).await {
        Ok(_) => flash.success(done).await?,
        Err(e) => {
            tracing::warn!(showcase_id = %id, "Failed to save screenshots: {e}");
            flash.error("Error occured to save the screenshots.").await?;
        }
    }

    Ok(())
}
