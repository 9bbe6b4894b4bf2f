use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Interactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Interactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Interactions::Question).text().not_null())
                    .col(ColumnDef::new(Interactions::Answer).text().not_null())
                    .col(
                        ColumnDef::new(Interactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Interactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // Soft-delete marker, only ever set by hand
                    .col(ColumnDef::new(Interactions::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Interactions::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Interactions {
    Table,
    Id,
    Question,
    Answer,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
