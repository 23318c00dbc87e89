pub use sea_orm_migration::prelude::*;

mod m20261015_000001_create_users;
mod m20261015_000002_create_applications;
mod m20261015_000003_create_tokens;
mod m20261015_000004_create_showcases;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261015_000001_create_users::Migration),
            Box::new(m20261015_000002_create_applications::Migration),
            Box::new(m20261015_000003_create_tokens::Migration),
            Box::new(m20261015_000004_create_showcases::Migration),
        ]
    }
}
