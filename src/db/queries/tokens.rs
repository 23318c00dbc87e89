use entity::token::{Column, Entity};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter,
};

pub async fn count_for_app<C: ConnectionTrait>(db: &C, app_id: &str) -> Result<u64, DbErr> {
    Entity::find()
        .filter(Column::AppId.eq(app_id))
        .count(db)
        .await
}

/// Applies to every token of the application, whoever it was issued to.
pub async fn set_disabled_for_app<C: ConnectionTrait>(
    db: &C,
    app_id: &str,
    disabled: bool,
) -> Result<u64, DbErr> {
    let result = Entity::update_many()
        .col_expr(Column::Disabled, Expr::value(disabled))
        .filter(Column::AppId.eq(app_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete_for_app_and_user<C: ConnectionTrait>(
    db: &C,
    app_id: &str,
    user_id: &str,
) -> Result<u64, DbErr> {
    let result = Entity::delete_many()
        .filter(Column::AppId.eq(app_id))
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
