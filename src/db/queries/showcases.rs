use entity::showcase::{Column, Entity, Model};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::pagination::{self, Page, PER_PAGE};
use crate::slug::slugify;

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: &str) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id.to_string()).one(db).await
}

pub async fn list<C: ConnectionTrait>(db: &C, page: u64) -> Result<Page<Model>, DbErr> {
    let paginator = Entity::find()
        .order_by_desc(Column::CreatedAt)
        .paginate(db, PER_PAGE);

    pagination::fetch(paginator, page).await
}

async fn slug_taken<C: ConnectionTrait>(db: &C, slug: &str) -> Result<bool, DbErr> {
    let count = Entity::find()
        .filter(Column::Slug.eq(slug))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Slug for `name` that no stored showcase uses yet. A taken slug gets the
/// current unix timestamp appended, plus a counter if that is taken too.
pub async fn unique_slug<C: ConnectionTrait>(db: &C, name: &str) -> Result<String, DbErr> {
    let base = slugify(name);
    if !slug_taken(db, &base).await? {
        return Ok(base);
    }

    let stamped = format!("{base}-{}", chrono::Utc::now().timestamp());
    let mut candidate = stamped.clone();
    let mut n = 1;
    while slug_taken(db, &candidate).await? {
        n += 1;
        candidate = format!("{stamped}-{n}");
    }

    Ok(candidate)
}
