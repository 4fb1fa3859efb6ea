use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Stats recomputation groups member channels by status.
        manager
            .create_index(
                Index::create()
                    .name("idx_channels_playlist_status")
                    .table(Channels::Table)
                    .col(Channels::PlaylistId)
                    .col(Channels::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_channels_status")
                    .table(Channels::Table)
                    .col(Channels::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_channels_status")
                    .table(Channels::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_channels_playlist_status")
                    .table(Channels::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Channels {
    Table,
    PlaylistId,
    Status,
}
