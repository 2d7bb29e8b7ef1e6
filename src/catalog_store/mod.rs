//! Data access for the music catalog.
//!
//! Layering, bottom up: [`ConnectionProvider`] opens one fresh SQLite
//! connection per statement, [`StatementExecutor`] runs a single query or
//! mutation over it, [`CatalogRepository`] and [`ReportAggregator`] compose
//! executor calls into domain operations. There are no transactions in this
//! layer: consistency across statements relies on SQLite's per-statement
//! guarantees, which is a documented limitation for concurrent multi-client
//! use.

mod connection;
mod error;
mod executor;
mod models;
mod repository;
mod reports;
mod schema;

pub use connection::ConnectionProvider;
pub use error::{CatalogError, ValidationError};
pub use executor::{Cell, RowSet, StatementExecutor};
pub use models::{Artist, Plan, Playlist, Song, User};
pub use repository::{
    AddSongsOutcome, CatalogRepository, FollowOutcome, SkipReason, SkippedSong, UnfollowOutcome,
};
pub use reports::ReportAggregator;
pub use schema::AdminTable;
