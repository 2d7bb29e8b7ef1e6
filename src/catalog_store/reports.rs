use super::error::CatalogError;
use super::executor::{RowSet, StatementExecutor};

const RANKED_LIMIT: usize = 100;
const GENRE_LIMIT: usize = 10;
const FOLLOW_RANK_LIMIT: usize = 20;

/// Read-only aggregate queries for the admin panel. Everything here goes
/// through the same executor as the repository and has no side effects.
pub struct ReportAggregator {
    executor: StatementExecutor,
}

impl ReportAggregator {
    pub fn new(executor: StatementExecutor) -> Self {
        ReportAggregator { executor }
    }

    /// Artists ranked by follower count, ties broken by name.
    pub fn artists_by_followers(&self) -> Result<RowSet, CatalogError> {
        self.executor.query(
            &format!(
                "SELECT a.artist_id, \
                        TRIM(IFNULL(a.first_name, '') || ' ' || IFNULL(a.last_name, '')) AS artist_name, \
                        COUNT(f.user_id) AS follower_count \
                 FROM Artist a \
                 LEFT JOIN Follows f ON a.artist_id = f.artist_id \
                 GROUP BY a.artist_id \
                 ORDER BY follower_count DESC, artist_name \
                 LIMIT {}",
                RANKED_LIMIT
            ),
            &[],
        )
    }

    /// Users ranked by how many playlists they own, ties broken by name.
    pub fn users_by_playlist_count(&self) -> Result<RowSet, CatalogError> {
        self.executor.query(
            &format!(
                "SELECT u.user_id, \
                        TRIM(u.first_name || ' ' || IFNULL(u.second_name, '')) AS user_name, \
                        COUNT(p.playlist_id) AS playlist_count \
                 FROM User u \
                 LEFT JOIN Playlist p ON u.user_id = p.user_id \
                 GROUP BY u.user_id \
                 ORDER BY playlist_count DESC, user_name \
                 LIMIT {}",
                RANKED_LIMIT
            ),
            &[],
        )
    }

    /// Genres ranked by song count; rows without a genre are excluded.
    pub fn top_genres(&self) -> Result<RowSet, CatalogError> {
        self.executor.query(
            &format!(
                "SELECT genre, COUNT(*) AS song_count \
                 FROM Song \
                 WHERE genre IS NOT NULL AND genre <> '' \
                 GROUP BY genre \
                 ORDER BY song_count DESC, genre \
                 LIMIT {}",
                GENRE_LIMIT
            ),
            &[],
        )
    }

    /// Users ranked by how many artists they follow.
    pub fn users_by_follow_count(&self) -> Result<RowSet, CatalogError> {
        self.executor.query(
            &format!(
                "SELECT u.user_id, \
                        TRIM(u.first_name || ' ' || IFNULL(u.second_name, '')) AS user_name, \
                        COUNT(f.artist_id) AS follow_count \
                 FROM User u \
                 LEFT JOIN Follows f ON u.user_id = f.user_id \
                 GROUP BY u.user_id \
                 ORDER BY follow_count DESC, user_name \
                 LIMIT {}",
                FOLLOW_RANK_LIMIT
            ),
            &[],
        )
    }

    /// Average playlists per user, over users owning at least one playlist.
    pub fn average_playlists_per_user(&self) -> Result<RowSet, CatalogError> {
        self.executor.query(
            "SELECT ROUND(AVG(cnt), 2) AS avg_playlists_per_user \
             FROM (SELECT COUNT(*) AS cnt FROM Playlist GROUP BY user_id) t",
            &[],
        )
    }
}
