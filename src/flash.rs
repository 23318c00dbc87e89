use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::AppError;

const FLASH_KEY: &str = "_flash";
const OLD_INPUT_KEY: &str = "_old_input";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

/// What the previous request left behind for this one.
#[derive(Debug, Default)]
pub struct Flashed {
    pub message: Option<FlashMessage>,
    pub old_input: Option<serde_json::Value>,
}

/// One-shot messages carried in the session until the next rendered view.
#[derive(Debug, Clone)]
pub struct Flash {
    session: Session,
}

#[async_trait]
impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;

        Ok(Flash { session })
    }
}

impl Flash {
    pub async fn success(&self, message: impl Into<String>) -> Result<(), AppError> {
        self.put(FlashKind::Success, message.into()).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Result<(), AppError> {
        self.put(FlashKind::Error, message.into()).await
    }

    async fn put(&self, kind: FlashKind, message: String) -> Result<(), AppError> {
        self.session
            .insert(FLASH_KEY, FlashMessage { kind, message })
            .await?;
        Ok(())
    }

    /// Keeps submitted form input so the form can be refilled after a
    /// redirect back.
    pub async fn keep_input<T: Serialize>(&self, input: &T) -> Result<(), AppError> {
        self.session.insert(OLD_INPUT_KEY, input).await?;
        Ok(())
    }

    pub async fn take(&self) -> Result<Flashed, AppError> {
        let message = self.session.remove::<FlashMessage>(FLASH_KEY).await?;
        let old_input = self
            .session
            .remove::<serde_json::Value>(OLD_INPUT_KEY)
            .await?;

        Ok(Flashed { message, old_input })
    }
}
