use entity::user::{ActiveModel, Column, Entity, Model, Role, Status};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::pagination::{self, Page, PER_PAGE};

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: &str) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id.to_string()).one(db).await
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await
}

/// Regular (non-admin) accounts, newest first.
pub async fn list_members<C: ConnectionTrait>(db: &C, page: u64) -> Result<Page<Model>, DbErr> {
    let paginator = Entity::find()
        .filter(Column::Role.eq(Role::User))
        .order_by_desc(Column::CreatedAt)
        .paginate(db, PER_PAGE);

    pagination::fetch(paginator, page).await
}

pub async fn latest<C: ConnectionTrait>(db: &C, limit: u64) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    name: &str,
    email: &str,
    role: Role,
) -> Result<Model, DbErr> {
    let now = chrono::Utc::now().naive_utc();

    ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        role: Set(role),
        status: Set(Status::Active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

pub async fn set_status<C: ConnectionTrait>(
    db: &C,
    user: Model,
    status: Status,
) -> Result<Model, DbErr> {
    let mut active: ActiveModel = user.into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await
}
