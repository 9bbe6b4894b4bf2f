use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Listing and readiness both filter out soft-deleted rows
        manager
            .create_index(
                Index::create()
                    .name("idx_interactions_deleted_at")
                    .table(Interactions::Table)
                    .col(Interactions::DeletedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_interactions_deleted_at").to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Interactions {
    Table,
    DeletedAt,
}
