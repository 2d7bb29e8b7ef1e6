use thiserror::Error;

/// Errors surfaced by the store layer. Callers branch on the variant, never
/// on the message text.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] rusqlite::Error),

    #[error("Statement failed: {0}")]
    StatementFailed(#[source] rusqlite::Error),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A playlist-scoped mutation matched no row: the id is unknown or the
    /// playlist belongs to another user. The two cases are indistinguishable
    /// on purpose, the caller is not told which ids exist for other users.
    #[error("Playlist not found or not owned by you")]
    NotFoundOrNotOwned,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("User id cannot be empty")]
    EmptyUserId,

    #[error("Playlist name cannot be empty")]
    EmptyPlaylistName,

    #[error("Artist id cannot be empty")]
    EmptyArtistId,

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Unknown artist '{0}'")]
    UnknownArtist(String),

    #[error("Deletion requires explicit confirmation")]
    DeleteNotConfirmed,

    #[error("Table '{0}' is not recognized or not allowed")]
    UnknownTable(String),
}

impl CatalogError {
    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::Validation(_))
    }
}
