use entity::application::{ActiveModel, Column, Entity, Model};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::auth::policy::Scope;

fn scoped(find: Select<Entity>, scope: &Scope) -> Select<Entity> {
    match scope {
        Scope::All => find,
        Scope::OwnedBy(owner_id) => find.filter(Column::OwnerId.eq(owner_id.as_str())),
    }
}

/// Newest first. `app_type` narrows to an exact type match.
pub async fn list<C: ConnectionTrait>(
    db: &C,
    scope: &Scope,
    app_type: Option<&str>,
) -> Result<Vec<Model>, DbErr> {
    let mut find = scoped(Entity::find(), scope);
    if let Some(app_type) = app_type.filter(|t| !t.is_empty()) {
        find = find.filter(Column::AppType.eq(app_type));
    }

    find.order_by_desc(Column::CreatedAt).all(db).await
}

pub async fn find_in_scope<C: ConnectionTrait>(
    db: &C,
    id: &str,
    scope: &Scope,
) -> Result<Option<Model>, DbErr> {
    scoped(Entity::find_by_id(id.to_string()), scope)
        .one(db)
        .await
}

pub async fn latest<C: ConnectionTrait>(db: &C, limit: u64) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
}

/// Stores a new application without a key; see [`assign_key`].
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    name: &str,
    description: &str,
    app_type: &str,
) -> Result<Model, DbErr> {
    let now = chrono::Utc::now().naive_utc();

    ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        owner_id: Set(owner_id.to_string()),
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        app_type: Set(app_type.to_string()),
        key: Set(None),
        disabled: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

pub async fn assign_key<C: ConnectionTrait>(db: &C, app: Model, key: String) -> Result<Model, DbErr> {
    let mut active: ActiveModel = app.into();
    active.key = Set(Some(key));
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await
}

pub async fn set_disabled<C: ConnectionTrait>(
    db: &C,
    app: Model,
    disabled: bool,
) -> Result<Model, DbErr> {
    let mut active: ActiveModel = app.into();
    active.disabled = Set(disabled);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await
}

/// Returns the number of rows removed, zero when the id is outside `scope`.
pub async fn delete_in_scope<C: ConnectionTrait>(
    db: &C,
    id: &str,
    scope: &Scope,
) -> Result<u64, DbErr> {
    let mut delete = Entity::delete_many().filter(Column::Id.eq(id));
    if let Scope::OwnedBy(owner_id) = scope {
        delete = delete.filter(Column::OwnerId.eq(owner_id.as_str()));
    }

    Ok(delete.exec(db).await?.rows_affected)
}
