use crate::sqlite_persistence::{Table, VersionedSchema};
use std::fmt;
use std::str::FromStr;

use super::error::ValidationError;

const USER_TABLE: Table = Table {
    name: "User",
    schema: "CREATE TABLE User (user_id TEXT NOT NULL UNIQUE, first_name TEXT NOT NULL, second_name TEXT, PRIMARY KEY (user_id));",
    indices: &[],
};

const ARTIST_TABLE: Table = Table {
    name: "Artist",
    schema: "CREATE TABLE Artist (artist_id TEXT NOT NULL UNIQUE, first_name TEXT, last_name TEXT, PRIMARY KEY (artist_id));",
    indices: &[],
};

const SONG_TABLE: Table = Table {
    name: "Song",
    schema: "CREATE TABLE Song (song_id TEXT NOT NULL UNIQUE, name TEXT NOT NULL, genre TEXT, PRIMARY KEY (song_id));",
    indices: &["CREATE INDEX song_genre_index ON Song (genre);"],
};

const PLAYLIST_TABLE: Table = Table {
    name: "Playlist",
    schema: "CREATE TABLE Playlist (playlist_id TEXT NOT NULL UNIQUE, playlist_name TEXT NOT NULL, created_date TEXT NOT NULL, user_id TEXT NOT NULL REFERENCES User (user_id), PRIMARY KEY (playlist_id));",
    indices: &["CREATE INDEX playlist_user_index ON Playlist (user_id);"],
};

const SONGS_IN_PLAYLIST_TABLE: Table = Table {
    name: "SongsInPlaylist",
    schema: "CREATE TABLE SongsInPlaylist (playlist_id TEXT NOT NULL REFERENCES Playlist (playlist_id), song_id TEXT NOT NULL REFERENCES Song (song_id), UNIQUE (playlist_id, song_id));",
    indices: &["CREATE INDEX songs_in_playlist_index ON SongsInPlaylist (playlist_id);"],
};

const FOLLOWS_TABLE: Table = Table {
    name: "Follows",
    schema: "CREATE TABLE Follows (user_id TEXT NOT NULL REFERENCES User (user_id), artist_id TEXT NOT NULL REFERENCES Artist (artist_id), UNIQUE (user_id, artist_id));",
    indices: &["CREATE INDEX follows_user_index ON Follows (user_id);"],
};

const PLAN_TABLE: Table = Table {
    name: "Plan",
    schema: "CREATE TABLE Plan (plan_id TEXT NOT NULL UNIQUE, plan_name TEXT NOT NULL, price REAL, PRIMARY KEY (plan_id));",
    indices: &[],
};

const ADVERTISEMENT_TABLE: Table = Table {
    name: "Advertisement",
    schema: "CREATE TABLE Advertisement (ad_id TEXT NOT NULL UNIQUE, content TEXT, PRIMARY KEY (ad_id));",
    indices: &[],
};

const COMPOSES_TABLE: Table = Table {
    name: "Composes",
    schema: "CREATE TABLE Composes (artist_id TEXT NOT NULL REFERENCES Artist (artist_id), song_id TEXT NOT NULL REFERENCES Song (song_id), UNIQUE (artist_id, song_id));",
    indices: &[],
};

const ENROLLS_TABLE: Table = Table {
    name: "Enrolls",
    schema: "CREATE TABLE Enrolls (user_id TEXT NOT NULL REFERENCES User (user_id), plan_id TEXT NOT NULL REFERENCES Plan (plan_id), enroll_date TEXT, UNIQUE (user_id, plan_id));",
    indices: &[],
};

const FREE_TABLE: Table = Table {
    name: "Free",
    schema: "CREATE TABLE Free (plan_id TEXT NOT NULL UNIQUE REFERENCES Plan (plan_id), PRIMARY KEY (plan_id));",
    indices: &[],
};

const GETS_TABLE: Table = Table {
    name: "Gets",
    schema: "CREATE TABLE Gets (user_id TEXT NOT NULL REFERENCES User (user_id), ad_id TEXT NOT NULL REFERENCES Advertisement (ad_id), UNIQUE (user_id, ad_id));",
    indices: &[],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE,
        ARTIST_TABLE,
        SONG_TABLE,
        PLAYLIST_TABLE,
        SONGS_IN_PLAYLIST_TABLE,
        FOLLOWS_TABLE,
        PLAN_TABLE,
        ADVERTISEMENT_TABLE,
        COMPOSES_TABLE,
        ENROLLS_TABLE,
        FREE_TABLE,
        GETS_TABLE,
    ],
    migration: None,
}];

/// The closed set of tables the admin viewer may select from. Statement
/// text is always derived from this enum, never from the raw input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTable {
    Advertisement,
    Artist,
    Composes,
    Enrolls,
    Follows,
    Free,
    Gets,
    Plan,
    Playlist,
    Song,
    SongsInPlaylist,
    User,
}

impl AdminTable {
    pub const ALL: &'static [AdminTable] = &[
        AdminTable::Advertisement,
        AdminTable::Artist,
        AdminTable::Composes,
        AdminTable::Enrolls,
        AdminTable::Follows,
        AdminTable::Free,
        AdminTable::Gets,
        AdminTable::Plan,
        AdminTable::Playlist,
        AdminTable::Song,
        AdminTable::SongsInPlaylist,
        AdminTable::User,
    ];

    pub fn sql_name(&self) -> &'static str {
        match self {
            AdminTable::Advertisement => "Advertisement",
            AdminTable::Artist => "Artist",
            AdminTable::Composes => "Composes",
            AdminTable::Enrolls => "Enrolls",
            AdminTable::Follows => "Follows",
            AdminTable::Free => "Free",
            AdminTable::Gets => "Gets",
            AdminTable::Plan => "Plan",
            AdminTable::Playlist => "Playlist",
            AdminTable::Song => "Song",
            AdminTable::SongsInPlaylist => "SongsInPlaylist",
            AdminTable::User => "User",
        }
    }
}

impl fmt::Display for AdminTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl FromStr for AdminTable {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        AdminTable::ALL
            .iter()
            .copied()
            .find(|table| table.sql_name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::UnknownTable(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_admin_table_is_in_the_schema() {
        let schema_tables: Vec<&str> = CATALOG_VERSIONED_SCHEMAS
            .last()
            .unwrap()
            .tables
            .iter()
            .map(|t| t.name)
            .collect();
        for table in AdminTable::ALL {
            assert!(
                schema_tables.contains(&table.sql_name()),
                "{} missing from schema",
                table
            );
        }
    }

    #[test]
    fn parses_allowed_table_names() {
        assert_eq!("Playlist".parse::<AdminTable>().unwrap(), AdminTable::Playlist);
        assert_eq!(
            "songsinplaylist".parse::<AdminTable>().unwrap(),
            AdminTable::SongsInPlaylist
        );
        assert_eq!(" User ".parse::<AdminTable>().unwrap(), AdminTable::User);
    }

    #[test]
    fn rejects_unknown_table_names() {
        let err = "sqlite_master".parse::<AdminTable>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownTable("sqlite_master".to_string()));
        assert!("Playlist; DROP TABLE User".parse::<AdminTable>().is_err());
    }
}
