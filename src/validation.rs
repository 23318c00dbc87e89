use std::collections::BTreeMap;

use serde::Serialize;

/// Field name to messages, rendered back into the form view.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn required(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("The {field} field is required."));
    }
}

pub fn max_len(errors: &mut ValidationErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("The {field} may not be greater than {max} characters."),
        );
    }
}

/// Accepts absolute http(s) URLs only. Empty values are left to [`required`].
pub fn http_url(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        return;
    }

    let valid = reqwest::Url::parse(value.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false);

    if !valid {
        errors.add(field, format!("The {field} format is invalid."));
    }
}
