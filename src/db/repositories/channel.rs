use crate::domain::{ChannelId, ChannelStatus, PlaylistId};
use crate::entities::{channels, prelude::*};
use crate::models::{Channel, ChannelFilter, PlaylistStats};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashSet;

/// Repository for channel rows.
///
/// Borrows any connection, so the same calls run against the pool or inside
/// an open transaction.
pub struct ChannelRepository<'a, C> {
    conn: &'a C,
}

#[derive(Debug, FromQueryResult)]
struct StatusCount {
    status: ChannelStatus,
    count: i64,
}

impl<'a, C: ConnectionTrait> ChannelRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    fn map_model(m: channels::Model) -> Channel {
        Channel {
            id: ChannelId::from(m.id),
            name: m.name,
            url: m.url,
            status: m.status,
            playlist_id: m.playlist_id.map(PlaylistId::from),
            created_at: m.created_at,
            updated_at: m.updated_at,
            last_checked: m.last_checked,
            checked_by: m.checked_by,
        }
    }

    fn to_active_model(channel: &Channel) -> channels::ActiveModel {
        channels::ActiveModel {
            id: Set(channel.id.to_string()),
            name: Set(channel.name.clone()),
            url: Set(channel.url.clone()),
            status: Set(channel.status),
            playlist_id: Set(channel.playlist_id.as_ref().map(ToString::to_string)),
            created_at: Set(channel.created_at),
            updated_at: Set(channel.updated_at),
            last_checked: Set(channel.last_checked),
            checked_by: Set(channel.checked_by.clone()),
        }
    }

    pub async fn insert(&self, channel: &Channel) -> Result<(), DbErr> {
        Channels::insert(Self::to_active_model(channel))
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    /// Inserts rows in chunks to stay under SQLite's bound-parameter limit.
    pub async fn insert_many(&self, channels: &[Channel], chunk_size: usize) -> Result<(), DbErr> {
        for chunk in channels.chunks(chunk_size.max(1)) {
            Channels::insert_many(chunk.iter().map(Self::to_active_model))
                .exec_without_returning(self.conn)
                .await?;
        }
        Ok(())
    }

    pub async fn get(&self, id: &ChannelId) -> Result<Option<Channel>, DbErr> {
        let row = Channels::find_by_id(id.as_str()).one(self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn list(&self, filter: &ChannelFilter) -> Result<Vec<Channel>, DbErr> {
        let mut query = Channels::find();

        if let Some(status) = filter.status {
            query = query.filter(channels::Column::Status.eq(status));
        }
        if let Some(playlist) = &filter.playlist_id {
            query = query.filter(channels::Column::PlaylistId.eq(playlist.as_str()));
        }

        let rows = query
            .order_by_asc(channels::Column::Name)
            .order_by_asc(channels::Column::Id)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn urls_in_playlist(&self, playlist: &PlaylistId) -> Result<HashSet<String>, DbErr> {
        let urls: Vec<String> = Channels::find()
            .select_only()
            .column(channels::Column::Url)
            .filter(channels::Column::PlaylistId.eq(playlist.as_str()))
            .into_tuple()
            .all(self.conn)
            .await?;

        Ok(urls.into_iter().collect())
    }

    /// Writes every mutable field of `channel` back to its row.
    pub async fn update(&self, channel: &Channel) -> Result<(), DbErr> {
        Channels::update(Self::to_active_model(channel))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &ChannelId) -> Result<bool, DbErr> {
        let result = Channels::delete_by_id(id.as_str()).exec(self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_for_playlist(&self, playlist: &PlaylistId) -> Result<u64, DbErr> {
        let result = Channels::delete_many()
            .filter(channels::Column::PlaylistId.eq(playlist.as_str()))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn detach_from_playlist(
        &self,
        playlist: &PlaylistId,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = Channels::update_many()
            .col_expr(
                channels::Column::PlaylistId,
                Expr::value(Option::<String>::None),
            )
            .col_expr(channels::Column::UpdatedAt, Expr::value(now))
            .filter(channels::Column::PlaylistId.eq(playlist.as_str()))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Counts member channels of `playlist` by status in one grouped query.
    pub async fn status_counts(&self, playlist: &PlaylistId) -> Result<PlaylistStats, DbErr> {
        let query = Channels::find().filter(channels::Column::PlaylistId.eq(playlist.as_str()));
        self.grouped_counts(query).await
    }

    /// Status counts across every channel in the catalog.
    pub async fn status_counts_all(&self) -> Result<PlaylistStats, DbErr> {
        self.grouped_counts(Channels::find()).await
    }

    async fn grouped_counts(
        &self,
        query: sea_orm::Select<Channels>,
    ) -> Result<PlaylistStats, DbErr> {
        let rows = query
            .select_only()
            .column(channels::Column::Status)
            .column_as(Expr::col(channels::Column::Id).count(), "count")
            .group_by(channels::Column::Status)
            .into_model::<StatusCount>()
            .all(self.conn)
            .await?;

        let mut stats = PlaylistStats::default();
        for row in rows {
            stats.add(row.status, u64::try_from(row.count).unwrap_or(0));
        }
        Ok(stats)
    }

    pub async fn count_unassigned(&self) -> Result<u64, DbErr> {
        Channels::find()
            .filter(channels::Column::PlaylistId.is_null())
            .count(self.conn)
            .await
    }
}
