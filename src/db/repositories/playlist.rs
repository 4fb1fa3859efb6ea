use crate::domain::PlaylistId;
use crate::entities::{playlists, prelude::*};
use crate::models::{Playlist, PlaylistStats};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

/// Repository for playlist rows, including the denormalized stats columns.
pub struct PlaylistRepository<'a, C> {
    conn: &'a C,
}

const fn to_count(value: i64) -> u64 {
    if value < 0 { 0 } else { value.unsigned_abs() }
}

fn to_column(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl<'a, C: ConnectionTrait> PlaylistRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    fn map_model(m: playlists::Model) -> Playlist {
        Playlist {
            id: PlaylistId::from(m.id),
            name: m.name,
            url: m.url,
            enabled: m.enabled,
            channel_count: to_count(m.channel_count),
            stats: PlaylistStats {
                pending: to_count(m.stats_pending),
                active: to_count(m.stats_active),
                inactive: to_count(m.stats_inactive),
                broken: to_count(m.stats_broken),
            },
            added_at: m.added_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    pub async fn insert(&self, playlist: &Playlist) -> Result<(), DbErr> {
        let active_model = playlists::ActiveModel {
            id: Set(playlist.id.to_string()),
            name: Set(playlist.name.clone()),
            url: Set(playlist.url.clone()),
            enabled: Set(playlist.enabled),
            channel_count: Set(to_column(playlist.channel_count)),
            stats_pending: Set(to_column(playlist.stats.pending)),
            stats_active: Set(to_column(playlist.stats.active)),
            stats_inactive: Set(to_column(playlist.stats.inactive)),
            stats_broken: Set(to_column(playlist.stats.broken)),
            stats_version: Set(0),
            added_at: Set(playlist.added_at),
            created_at: Set(playlist.created_at),
            updated_at: Set(playlist.updated_at),
        };

        Playlists::insert(active_model)
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    pub async fn get(&self, id: &PlaylistId) -> Result<Option<Playlist>, DbErr> {
        let row = Playlists::find_by_id(id.as_str()).one(self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn exists(&self, id: &PlaylistId) -> Result<bool, DbErr> {
        let count = Playlists::find_by_id(id.as_str()).count(self.conn).await?;
        Ok(count > 0)
    }

    pub async fn list(&self) -> Result<Vec<Playlist>, DbErr> {
        let rows = Playlists::find()
            .order_by_asc(playlists::Column::Name)
            .order_by_asc(playlists::Column::Id)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Writes the user-editable fields. Stats columns are left untouched.
    pub async fn update_details(&self, playlist: &Playlist) -> Result<bool, DbErr> {
        let result = Playlists::update_many()
            .col_expr(playlists::Column::Name, Expr::value(playlist.name.clone()))
            .col_expr(playlists::Column::Url, Expr::value(playlist.url.clone()))
            .col_expr(playlists::Column::Enabled, Expr::value(playlist.enabled))
            .col_expr(playlists::Column::UpdatedAt, Expr::value(playlist.updated_at))
            .filter(playlists::Column::Id.eq(playlist.id.as_str()))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn delete(&self, id: &PlaylistId) -> Result<bool, DbErr> {
        let result = Playlists::delete_by_id(id.as_str()).exec(self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn stats_version(&self, id: &PlaylistId) -> Result<Option<i64>, DbErr> {
        let row = Playlists::find_by_id(id.as_str()).one(self.conn).await?;
        Ok(row.map(|m| m.stats_version))
    }

    /// Stores `stats` only if nobody bumped the version since it was read.
    ///
    /// Returns false when the version moved, i.e. the caller lost the race.
    pub async fn write_stats_if_version(
        &self,
        id: &PlaylistId,
        expected_version: i64,
        stats: &PlaylistStats,
    ) -> Result<bool, DbErr> {
        let result = Playlists::update_many()
            .col_expr(
                playlists::Column::ChannelCount,
                Expr::value(to_column(stats.total())),
            )
            .col_expr(
                playlists::Column::StatsPending,
                Expr::value(to_column(stats.pending)),
            )
            .col_expr(
                playlists::Column::StatsActive,
                Expr::value(to_column(stats.active)),
            )
            .col_expr(
                playlists::Column::StatsInactive,
                Expr::value(to_column(stats.inactive)),
            )
            .col_expr(
                playlists::Column::StatsBroken,
                Expr::value(to_column(stats.broken)),
            )
            .col_expr(
                playlists::Column::StatsVersion,
                Expr::value(expected_version + 1),
            )
            .filter(playlists::Column::Id.eq(id.as_str()))
            .filter(playlists::Column::StatsVersion.eq(expected_version))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        Playlists::find().count(self.conn).await
    }

    pub async fn count_enabled(&self) -> Result<u64, DbErr> {
        Playlists::find()
            .filter(playlists::Column::Enabled.eq(true))
            .count(self.conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(to_count(-3), 0);
        assert_eq!(to_count(7), 7);
        assert_eq!(to_column(u64::MAX), i64::MAX);
    }
}
