use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::AppError;
use crate::flash::{Flash, Flashed};

/// A named view with its bound data. Rendering consumes any pending flash
/// message, so it shows exactly once.
#[derive(Debug)]
pub struct View {
    name: &'static str,
    status: StatusCode,
    data: Map<String, Value>,
}

impl View {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            status: StatusCode::OK,
            data: Map::new(),
        }
    }

    /// Binds `value` under `key`. A value that fails to serialize is logged
    /// and bound as null.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::error!(view = self.name, key, "Failed to serialize view data: {e}");
            Value::Null
        });
        self.data.insert(key.to_string(), value);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub async fn render(self, flash: &Flash) -> Result<Response, AppError> {
        let Flashed { message, old_input } = flash.take().await?;

        let body = json!({
            "view": self.name,
            "flash": message,
            "old": old_input,
            "data": self.data,
        });

        Ok((self.status, Json(body)).into_response())
    }
}

pub fn redirect(to: &str) -> Response {
    Redirect::to(to).into_response()
}

/// Redirects to the page the request came from, or `fallback` when the
/// client sent no Referer on this host.
pub fn back(headers: &HeaderMap, fallback: &str) -> Response {
    let target = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| same_origin_path(referer, headers))
        .unwrap_or_else(|| fallback.to_string());

    Redirect::to(&target).into_response()
}

/// Path and query of `referer` when it is relative, or absolute with the
/// request's own `Host`.
fn same_origin_path(referer: &str, headers: &HeaderMap) -> Option<String> {
    if referer.starts_with('/') && !referer.starts_with("//") {
        return Some(referer.to_string());
    }

    let url = reqwest::Url::parse(referer).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = headers.get(header::HOST)?.to_str().ok()?;
    let authority = match url.port() {
        Some(port) => format!("{}:{port}", url.host_str()?),
        None => url.host_str()?.to_string(),
    };
    if !authority.eq_ignore_ascii_case(host) {
        return None;
    }

    Some(match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    })
}
