use super::error::{CatalogError, ValidationError};
use super::executor::{RowSet, StatementExecutor};
use super::models::{opt_text_at, text_at, Artist, Plan, Playlist, Song, User};
use super::schema::AdminTable;
use crate::ids::{self, IdSpec};
use chrono::Local;
use tracing::{debug, info};

const VIEW_TABLE_LIMIT: usize = 1000;

/// Why a song id passed to [`CatalogRepository::add_songs_to_playlist`] was
/// skipped instead of inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownSong,
    AlreadyInPlaylist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSong {
    pub song_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct AddSongsOutcome {
    pub added: usize,
    pub skipped: Vec<SkippedSong>,
}

/// Following an artist the user already follows is a no-op, reported as an
/// outcome rather than an error so the caller can warn instead of fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Unfollowed,
    NotFollowing,
}

/// The domain operations of the catalog: playlist management, song
/// membership, follow relations and row creation for the entities that lack
/// a natural key. Each operation validates its inputs, then issues one
/// parameterized statement at a time through the executor.
pub struct CatalogRepository {
    executor: StatementExecutor,
}

impl CatalogRepository {
    pub fn new(executor: StatementExecutor) -> Self {
        CatalogRepository { executor }
    }

    // ---------- lookups ----------

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, CatalogError> {
        let user_id = non_empty(user_id, ValidationError::EmptyUserId)?;
        let rows = self.executor.query(
            "SELECT user_id, first_name, second_name FROM User WHERE user_id = ?1",
            &[&user_id],
        )?;
        Ok(rows.rows.first().map(|cells| User {
            user_id: text_at(cells, 0),
            first_name: text_at(cells, 1),
            second_name: opt_text_at(cells, 2),
        }))
    }

    pub fn playlists_of(&self, user_id: &str) -> Result<Vec<Playlist>, CatalogError> {
        let user_id = non_empty(user_id, ValidationError::EmptyUserId)?;
        let rows = self.executor.query(
            "SELECT playlist_id, playlist_name, created_date, user_id FROM Playlist WHERE user_id = ?1 ORDER BY created_date DESC, playlist_name",
            &[&user_id],
        )?;
        Ok(rows
            .rows
            .iter()
            .map(|cells| Playlist {
                playlist_id: text_at(cells, 0),
                playlist_name: text_at(cells, 1),
                created_date: text_at(cells, 2),
                user_id: text_at(cells, 3),
            })
            .collect())
    }

    pub fn all_songs(&self) -> Result<Vec<Song>, CatalogError> {
        let rows = self.executor.query(
            "SELECT song_id, name, genre FROM Song ORDER BY name",
            &[],
        )?;
        Ok(rows
            .rows
            .iter()
            .map(|cells| Song {
                song_id: text_at(cells, 0),
                name: text_at(cells, 1),
                genre: opt_text_at(cells, 2),
            })
            .collect())
    }

    pub fn all_artists(&self) -> Result<Vec<Artist>, CatalogError> {
        let rows = self.executor.query(
            "SELECT artist_id, first_name, last_name FROM Artist ORDER BY last_name, first_name",
            &[],
        )?;
        Ok(rows.rows.iter().map(artist_from_cells).collect())
    }

    pub fn followed_artists(&self, user_id: &str) -> Result<Vec<Artist>, CatalogError> {
        let user_id = non_empty(user_id, ValidationError::EmptyUserId)?;
        let rows = self.executor.query(
            "SELECT a.artist_id, a.first_name, a.last_name FROM Artist a JOIN Follows f ON a.artist_id = f.artist_id WHERE f.user_id = ?1 ORDER BY a.last_name, a.first_name",
            &[&user_id],
        )?;
        Ok(rows.rows.iter().map(artist_from_cells).collect())
    }

    pub fn followed_artist_ids(&self, user_id: &str) -> Result<Vec<String>, CatalogError> {
        let user_id = non_empty(user_id, ValidationError::EmptyUserId)?;
        let rows = self.executor.query(
            "SELECT artist_id FROM Follows WHERE user_id = ?1",
            &[&user_id],
        )?;
        Ok(rows
            .rows
            .iter()
            .map(|cells| text_at(cells, 0))
            .collect())
    }

    // ---------- playlist management ----------

    pub fn create_playlist(&self, user_id: &str, name: &str) -> Result<Playlist, CatalogError> {
        let user_id = non_empty(user_id, ValidationError::EmptyUserId)?;
        let name = non_empty(name, ValidationError::EmptyPlaylistName)?;

        let playlist_id = self.next_id(&ids::PLAYLIST_ID)?;
        let created_date = Local::now().date_naive().to_string();
        self.executor.mutate(
            "INSERT INTO Playlist (playlist_id, playlist_name, created_date, user_id) VALUES (?1, ?2, ?3, ?4)",
            &[&playlist_id, &name, &created_date, &user_id],
        )?;
        info!("Created playlist {} for user {}", playlist_id, user_id);

        Ok(Playlist {
            playlist_id,
            playlist_name: name.to_string(),
            created_date,
            user_id: user_id.to_string(),
        })
    }

    /// Inserts one membership row per song id. Unknown songs and songs
    /// already in the playlist are skipped, the loop keeps going with the
    /// remaining ids.
    pub fn add_songs_to_playlist(
        &self,
        user_id: &str,
        playlist_id: &str,
        song_ids: &[String],
    ) -> Result<AddSongsOutcome, CatalogError> {
        let user_id = non_empty(user_id, ValidationError::EmptyUserId)?;
        if !self.user_owns_playlist(user_id, playlist_id)? {
            return Err(CatalogError::NotFoundOrNotOwned);
        }

        let mut outcome = AddSongsOutcome::default();
        for song_id in song_ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !self.song_exists(song_id)? {
                debug!("Song {} not found, skipping", song_id);
                outcome.skipped.push(SkippedSong {
                    song_id: song_id.to_string(),
                    reason: SkipReason::UnknownSong,
                });
                continue;
            }
            if self.is_song_in_playlist(playlist_id, song_id)? {
                debug!("Song {} already in playlist {}, skipping", song_id, playlist_id);
                outcome.skipped.push(SkippedSong {
                    song_id: song_id.to_string(),
                    reason: SkipReason::AlreadyInPlaylist,
                });
                continue;
            }
            self.executor.mutate(
                "INSERT INTO SongsInPlaylist (playlist_id, song_id) VALUES (?1, ?2)",
                &[&playlist_id, &song_id],
            )?;
            outcome.added += 1;
        }
        Ok(outcome)
    }

    /// Membership rows go first so a playlist row never outlives them the
    /// other way around; the playlist delete is scoped to the owner.
    pub fn delete_playlist(
        &self,
        user_id: &str,
        playlist_id: &str,
        confirmed: bool,
    ) -> Result<(), CatalogError> {
        let user_id = non_empty(user_id, ValidationError::EmptyUserId)?;
        if !confirmed {
            return Err(ValidationError::DeleteNotConfirmed.into());
        }
        if !self.user_owns_playlist(user_id, playlist_id)? {
            return Err(CatalogError::NotFoundOrNotOwned);
        }

        self.executor.mutate(
            "DELETE FROM SongsInPlaylist WHERE playlist_id = ?1",
            &[&playlist_id],
        )?;
        let affected = self.executor.mutate(
            "DELETE FROM Playlist WHERE playlist_id = ?1 AND user_id = ?2",
            &[&playlist_id, &user_id],
        )?;
        if affected == 0 {
            return Err(CatalogError::NotFoundOrNotOwned);
        }
        info!("Deleted playlist {} of user {}", playlist_id, user_id);
        Ok(())
    }

    // ---------- follow relations ----------

    pub fn follow_artist(
        &self,
        user_id: &str,
        artist_id: &str,
    ) -> Result<FollowOutcome, CatalogError> {
        let user_id = non_empty(user_id, ValidationError::EmptyUserId)?;
        let artist_id = non_empty(artist_id, ValidationError::EmptyArtistId)?;

        if !self.artist_exists(artist_id)? {
            return Err(ValidationError::UnknownArtist(artist_id.to_string()).into());
        }
        if self.is_following(user_id, artist_id)? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }
        self.executor.mutate(
            "INSERT INTO Follows (user_id, artist_id) VALUES (?1, ?2)",
            &[&user_id, &artist_id],
        )?;
        Ok(FollowOutcome::Followed)
    }

    pub fn unfollow_artist(
        &self,
        user_id: &str,
        artist_id: &str,
    ) -> Result<UnfollowOutcome, CatalogError> {
        let user_id = non_empty(user_id, ValidationError::EmptyUserId)?;
        let artist_id = non_empty(artist_id, ValidationError::EmptyArtistId)?;

        if !self.is_following(user_id, artist_id)? {
            return Ok(UnfollowOutcome::NotFollowing);
        }
        self.executor.mutate(
            "DELETE FROM Follows WHERE user_id = ?1 AND artist_id = ?2",
            &[&user_id, &artist_id],
        )?;
        Ok(UnfollowOutcome::Unfollowed)
    }

    // ---------- row creation ----------

    pub fn create_user(
        &self,
        first_name: &str,
        second_name: Option<&str>,
    ) -> Result<User, CatalogError> {
        let first_name = non_empty(first_name, ValidationError::EmptyName)?;
        let user_id = self.next_id(&ids::USER_ID)?;
        self.executor.mutate(
            "INSERT INTO User (user_id, first_name, second_name) VALUES (?1, ?2, ?3)",
            &[&user_id, &first_name, &second_name],
        )?;
        Ok(User {
            user_id,
            first_name: first_name.to_string(),
            second_name: second_name.map(String::from),
        })
    }

    pub fn create_artist(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Artist, CatalogError> {
        let first_name = non_empty(first_name, ValidationError::EmptyName)?;
        let artist_id = self.next_id(&ids::ARTIST_ID)?;
        self.executor.mutate(
            "INSERT INTO Artist (artist_id, first_name, last_name) VALUES (?1, ?2, ?3)",
            &[&artist_id, &first_name, &last_name],
        )?;
        Ok(Artist {
            artist_id,
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
        })
    }

    pub fn create_song(&self, name: &str, genre: Option<&str>) -> Result<Song, CatalogError> {
        let name = non_empty(name, ValidationError::EmptyName)?;
        let song_id = self.next_id(&ids::SONG_ID)?;
        self.executor.mutate(
            "INSERT INTO Song (song_id, name, genre) VALUES (?1, ?2, ?3)",
            &[&song_id, &name, &genre],
        )?;
        Ok(Song {
            song_id,
            name: name.to_string(),
            genre: genre.map(String::from),
        })
    }

    pub fn create_plan(&self, plan_name: &str, price: Option<f64>) -> Result<Plan, CatalogError> {
        let plan_name = non_empty(plan_name, ValidationError::EmptyName)?;
        let plan_id = ids::generate_plan_id(&mut rand::rng(), |candidate| {
            self.id_exists(&ids::PLAN_ID, candidate)
        })?;
        self.executor.mutate(
            "INSERT INTO Plan (plan_id, plan_name, price) VALUES (?1, ?2, ?3)",
            &[&plan_id, &plan_name, &price],
        )?;
        Ok(Plan {
            plan_id,
            plan_name: plan_name.to_string(),
            price,
        })
    }

    // ---------- admin ----------

    pub fn view_table(&self, table: AdminTable) -> Result<RowSet, CatalogError> {
        self.executor.query(
            &format!("SELECT * FROM {} LIMIT {}", table.sql_name(), VIEW_TABLE_LIMIT),
            &[],
        )
    }

    // ---------- internals ----------

    fn next_id(&self, spec: &IdSpec) -> Result<String, CatalogError> {
        ids::generate_id(spec, &mut rand::rng(), |candidate| {
            self.id_exists(spec, candidate)
        })
    }

    fn id_exists(&self, spec: &IdSpec, candidate: &str) -> Result<bool, CatalogError> {
        self.executor.exists(
            &format!(
                "SELECT {} FROM {} WHERE {} = ?1",
                spec.column, spec.table, spec.column
            ),
            &[&candidate],
        )
    }

    fn user_owns_playlist(&self, user_id: &str, playlist_id: &str) -> Result<bool, CatalogError> {
        self.executor.exists(
            "SELECT playlist_id FROM Playlist WHERE playlist_id = ?1 AND user_id = ?2",
            &[&playlist_id, &user_id],
        )
    }

    fn song_exists(&self, song_id: &str) -> Result<bool, CatalogError> {
        self.executor.exists(
            "SELECT song_id FROM Song WHERE song_id = ?1",
            &[&song_id],
        )
    }

    fn artist_exists(&self, artist_id: &str) -> Result<bool, CatalogError> {
        self.executor.exists(
            "SELECT artist_id FROM Artist WHERE artist_id = ?1",
            &[&artist_id],
        )
    }

    fn is_following(&self, user_id: &str, artist_id: &str) -> Result<bool, CatalogError> {
        self.executor.exists(
            "SELECT artist_id FROM Follows WHERE user_id = ?1 AND artist_id = ?2",
            &[&user_id, &artist_id],
        )
    }

    fn is_song_in_playlist(&self, playlist_id: &str, song_id: &str) -> Result<bool, CatalogError> {
        self.executor.exists(
            "SELECT song_id FROM SongsInPlaylist WHERE playlist_id = ?1 AND song_id = ?2",
            &[&playlist_id, &song_id],
        )
    }
}

fn artist_from_cells(cells: &Vec<super::executor::Cell>) -> Artist {
    Artist {
        artist_id: text_at(cells, 0),
        first_name: opt_text_at(cells, 1),
        last_name: opt_text_at(cells, 2),
    }
}

fn non_empty<'a>(value: &'a str, error: ValidationError) -> Result<&'a str, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(error.into())
    } else {
        Ok(trimmed)
    }
}
