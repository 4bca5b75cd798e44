use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum PendingDrafts {
    Table,
    UserId,
    UserName,
    AmountMinor,
    Currency,
    Category,
    Item,
    RawText,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PendingDrafts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingDrafts::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PendingDrafts::UserName).string().not_null())
                    .col(
                        ColumnDef::new(PendingDrafts::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingDrafts::Currency).string().not_null())
                    .col(ColumnDef::new(PendingDrafts::Category).string().not_null())
                    .col(ColumnDef::new(PendingDrafts::Item).string().not_null())
                    .col(ColumnDef::new(PendingDrafts::RawText).string().not_null())
                    .col(ColumnDef::new(PendingDrafts::CreatedAt).timestamp())
                    .col(
                        ColumnDef::new(PendingDrafts::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PendingDrafts::Table).to_owned())
            .await
    }
}
