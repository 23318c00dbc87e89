use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
#[serde(rename_all = "lowercase")]
pub enum Published {
    #[sea_orm(string_value = "d")]
    Draft,
    #[sea_orm(string_value = "p")]
    Published,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "showcases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: String,
    pub url: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub app_type: String,
    pub icon: Option<String>,
    /// JSON array of screenshot references.
    pub screenshots: String,
    pub published: Published,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl Model {
    pub fn screenshot_list(&self) -> Vec<String> {
        serde_json::from_str(&self.screenshots).unwrap_or_default()
    }

    /// A showcase needs an icon and at least one screenshot before it is
    /// worth listing publicly.
    pub fn ready_to_publish(&self) -> bool {
        self.icon.is_some() && !self.screenshot_list().is_empty()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
