use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Showcases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Showcases::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Showcases::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Showcases::Slug)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Showcases::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Showcases::Url).string_len(2048).not_null())
                    .col(ColumnDef::new(Showcases::Type).string_len(64).not_null())
                    .col(ColumnDef::new(Showcases::Icon).string_len(2048).null())
                    .col(
                        ColumnDef::new(Showcases::Screenshots)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Showcases::Published)
                            .string_len(1)
                            .not_null()
                            .default("d"),
                    )
                    .col(
                        ColumnDef::new(Showcases::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Showcases::UpdatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Showcases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Showcases {
    Table,
    Id,
    Name,
    Slug,
    Description,
    Url,
    Type,
    Icon,
    Screenshots,
    Published,
    CreatedAt,
    UpdatedAt,
}
