use sea_orm::{Database, DatabaseConnection, DbErr};

pub type Db = DatabaseConnection;

pub async fn connect(database_url: &str) -> Result<Db, DbErr> {
    Database::connect(database_url).await
}
