use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod catalog_store;
mod cli_style;
mod config;
mod ids;
mod sqlite_persistence;

use catalog_store::{
    AdminTable, CatalogError, CatalogRepository, ConnectionProvider, FollowOutcome,
    ReportAggregator, SkipReason, StatementExecutor, UnfollowOutcome, ValidationError,
};
use cli_style::{get_styles, TableBuilder};
use config::{AppConfig, CliConfig, FileConfig};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles = get_styles())]
struct CliArgs {
    /// Path to the SQLite catalog database file. Created when missing.
    #[clap(value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Tracing filter, e.g. "info" or "kiwi_cli=debug".
    #[clap(long)]
    pub log_filter: Option<String>,
}

#[derive(Parser)]
#[command(styles = get_styles(), name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Log in with an existing user id, e.g. USER-AB12.
    Login { user_id: String },

    /// Log out of the current session.
    Logout,

    /// Shows the playlists of the logged-in user.
    Playlists,

    /// Creates a new playlist for the logged-in user.
    AddPlaylist {
        #[clap(num_args = 1.., required = true)]
        name: Vec<String>,
    },

    /// Adds one or more songs to one of your playlists.
    AddSongs {
        playlist_id: String,
        #[clap(num_args = 1.., required = true)]
        song_ids: Vec<String>,
    },

    /// Deletes one of your playlists and its song memberships.
    /// Requires --yes as explicit confirmation.
    DeletePlaylist {
        playlist_id: String,
        #[clap(long)]
        yes: bool,
    },

    /// Shows every artist; a star marks the ones you follow.
    Artists,

    /// Shows every song in the library.
    Songs,

    /// Shows the artists the logged-in user follows.
    Following,

    /// Follows an artist.
    Follow { artist_id: String },

    /// Unfollows an artist.
    Unfollow { artist_id: String },

    /// Admin: artists ranked by follower count.
    TopArtists,

    /// Admin: users ranked by playlist count.
    TopUsers,

    /// Admin: genres ranked by song count.
    TopGenres,

    /// Admin: users ranked by how many artists they follow.
    TopFollowers,

    /// Admin: average playlists per user, over users with at least one.
    AvgPlaylists,

    /// Admin: dumps a table from the allowed set.
    ViewTable { table: String },

    /// Admin: creates a user row with a generated USER- id.
    AddUser {
        first_name: String,
        second_name: Option<String>,
    },

    /// Admin: creates an artist row with a generated ARTIST- id.
    AddArtist {
        first_name: String,
        last_name: String,
    },

    /// Admin: creates a song row with a generated SONG- id.
    AddSong { name: String, genre: Option<String> },

    /// Admin: creates a subscription plan with a generated PLAN- id.
    AddPlan { name: String, price: Option<f64> },

    /// Shows the path of the current catalog database.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Warning(String),
    Error(String),
}

#[derive(Default)]
struct Session {
    user_id: Option<String>,
}

impl Session {
    fn current_user(&self) -> Result<&str, CommandExecutionResult> {
        self.user_id
            .as_deref()
            .ok_or_else(|| CommandExecutionResult::Error("Not logged in. Use: login <user-id>".to_string()))
    }
}

fn command_failed(err: CatalogError) -> CommandExecutionResult {
    if err.is_validation() {
        CommandExecutionResult::Warning(err.to_string())
    } else {
        CommandExecutionResult::Error(err.to_string())
    }
}

fn execute_command(
    line: String,
    session: &mut Session,
    repository: &CatalogRepository,
    reports: &ReportAggregator,
    db_path: &str,
) -> CommandExecutionResult {
    if line.trim().is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => match cli.command {
            InnerCommand::Login { user_id } => match repository.get_user(&user_id) {
                Ok(Some(user)) => {
                    cli_style::print_success(&format!(
                        "Welcome, {} ({})",
                        user.display_name(),
                        user.user_id
                    ));
                    session.user_id = Some(user.user_id);
                }
                Ok(None) => return CommandExecutionResult::Error("User not found.".to_string()),
                Err(err) => return command_failed(err),
            },
            InnerCommand::Logout => {
                session.user_id = None;
                cli_style::print_info("Logged out.");
            }
            InnerCommand::Playlists => {
                let user_id = match session.current_user() {
                    Ok(user_id) => user_id,
                    Err(result) => return result,
                };
                match repository.playlists_of(user_id) {
                    Ok(playlists) if playlists.is_empty() => {
                        cli_style::print_empty_list("No playlists yet.")
                    }
                    Ok(playlists) => {
                        cli_style::print_section_header(&format!("Playlists of {}", user_id));
                        let mut table =
                            TableBuilder::new(vec!["playlist_id", "playlist_name", "created_date"]);
                        for playlist in &playlists {
                            table.add_row(vec![
                                playlist.playlist_id.as_str(),
                                playlist.playlist_name.as_str(),
                                playlist.created_date.as_str(),
                            ]);
                        }
                        table.print();
                    }
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::AddPlaylist { name } => {
                let user_id = match session.current_user() {
                    Ok(user_id) => user_id,
                    Err(result) => return result,
                };
                match repository.create_playlist(user_id, &name.join(" ")) {
                    Ok(playlist) => cli_style::print_success(&format!(
                        "Playlist '{}' created (id={}).",
                        playlist.playlist_name, playlist.playlist_id
                    )),
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::AddSongs {
                playlist_id,
                song_ids,
            } => {
                let user_id = match session.current_user() {
                    Ok(user_id) => user_id,
                    Err(result) => return result,
                };
                match repository.add_songs_to_playlist(user_id, &playlist_id, &song_ids) {
                    Ok(outcome) => {
                        for skipped in &outcome.skipped {
                            let reason = match skipped.reason {
                                SkipReason::UnknownSong => "not found",
                                SkipReason::AlreadyInPlaylist => "already in playlist",
                            };
                            cli_style::print_warning(&format!(
                                "Song {} {}, skipped.",
                                skipped.song_id, reason
                            ));
                        }
                        cli_style::print_success(&format!(
                            "Added {} song(s) to playlist {}.",
                            outcome.added, playlist_id
                        ));
                    }
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::DeletePlaylist { playlist_id, yes } => {
                let user_id = match session.current_user() {
                    Ok(user_id) => user_id,
                    Err(result) => return result,
                };
                match repository.delete_playlist(user_id, &playlist_id, yes) {
                    Ok(()) => cli_style::print_success("Playlist deleted."),
                    Err(CatalogError::Validation(ValidationError::DeleteNotConfirmed)) => {
                        return CommandExecutionResult::Warning(format!(
                            "This deletes playlist {} and its songs. Re-run with --yes to confirm.",
                            playlist_id
                        ))
                    }
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::Artists => {
                let followed = match session.user_id.as_deref() {
                    Some(user_id) => match repository.followed_artist_ids(user_id) {
                        Ok(ids) => ids,
                        Err(err) => return command_failed(err),
                    },
                    None => Vec::new(),
                };
                match repository.all_artists() {
                    Ok(artists) if artists.is_empty() => {
                        cli_style::print_empty_list("No artists in the catalog.")
                    }
                    Ok(artists) => {
                        cli_style::print_section_header("Artists (★ = you follow)");
                        let mut table = TableBuilder::new(vec!["artist_id", "name", ""]);
                        for artist in &artists {
                            let marker = if followed.contains(&artist.artist_id) {
                                "★"
                            } else {
                                ""
                            };
                            table.add_row(vec![
                                artist.artist_id.clone(),
                                artist.display_name(),
                                marker.to_string(),
                            ]);
                        }
                        table.print();
                    }
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::Songs => match repository.all_songs() {
                Ok(songs) if songs.is_empty() => {
                    cli_style::print_empty_list("No songs in the library.")
                }
                Ok(songs) => {
                    cli_style::print_section_header("Songs");
                    let mut table = TableBuilder::new(vec!["song_id", "name", "genre"]);
                    for song in &songs {
                        table.add_row(vec![
                            song.song_id.clone(),
                            song.name.clone(),
                            song.genre.clone().unwrap_or_default(),
                        ]);
                    }
                    table.print();
                }
                Err(err) => return command_failed(err),
            },
            InnerCommand::Following => {
                let user_id = match session.current_user() {
                    Ok(user_id) => user_id,
                    Err(result) => return result,
                };
                match repository.followed_artists(user_id) {
                    Ok(artists) if artists.is_empty() => {
                        cli_style::print_empty_list("You do not follow any artist.")
                    }
                    Ok(artists) => {
                        cli_style::print_section_header(&format!("Artists followed by {}", user_id));
                        let mut table = TableBuilder::new(vec!["artist_id", "name"]);
                        for artist in &artists {
                            table.add_row(vec![artist.artist_id.clone(), artist.display_name()]);
                        }
                        table.print();
                    }
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::Follow { artist_id } => {
                let user_id = match session.current_user() {
                    Ok(user_id) => user_id,
                    Err(result) => return result,
                };
                match repository.follow_artist(user_id, &artist_id) {
                    Ok(FollowOutcome::Followed) => cli_style::print_success("Now following."),
                    Ok(FollowOutcome::AlreadyFollowing) => {
                        cli_style::print_warning("Already following.")
                    }
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::Unfollow { artist_id } => {
                let user_id = match session.current_user() {
                    Ok(user_id) => user_id,
                    Err(result) => return result,
                };
                match repository.unfollow_artist(user_id, &artist_id) {
                    Ok(UnfollowOutcome::Unfollowed) => cli_style::print_success("Unfollowed."),
                    Ok(UnfollowOutcome::NotFollowing) => {
                        cli_style::print_warning("You do not follow that artist.")
                    }
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::TopArtists => match reports.artists_by_followers() {
                Ok(rows) => {
                    cli_style::print_section_header("Artists by followers");
                    cli_style::print_row_set(&rows);
                }
                Err(err) => return command_failed(err),
            },
            InnerCommand::TopUsers => match reports.users_by_playlist_count() {
                Ok(rows) => {
                    cli_style::print_section_header("Users with most playlists");
                    cli_style::print_row_set(&rows);
                }
                Err(err) => return command_failed(err),
            },
            InnerCommand::TopGenres => match reports.top_genres() {
                Ok(rows) => {
                    cli_style::print_section_header("Top genres by number of songs");
                    cli_style::print_row_set(&rows);
                }
                Err(err) => return command_failed(err),
            },
            InnerCommand::TopFollowers => match reports.users_by_follow_count() {
                Ok(rows) => {
                    cli_style::print_section_header("Users who follow the most artists");
                    cli_style::print_row_set(&rows);
                }
                Err(err) => return command_failed(err),
            },
            InnerCommand::AvgPlaylists => match reports.average_playlists_per_user() {
                Ok(rows) => {
                    cli_style::print_section_header(
                        "Average playlists per user (users with >= 1 playlist)",
                    );
                    cli_style::print_row_set(&rows);
                }
                Err(err) => return command_failed(err),
            },
            InnerCommand::ViewTable { table } => {
                let table: AdminTable = match table.parse() {
                    Ok(table) => table,
                    Err(err) => {
                        return CommandExecutionResult::Warning(format!(
                            "{}. Allowed: {}",
                            err,
                            AdminTable::ALL
                                .iter()
                                .map(|t| t.sql_name())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))
                    }
                };
                match repository.view_table(table) {
                    Ok(rows) => {
                        cli_style::print_section_header(&format!("Table: {}", table));
                        cli_style::print_row_set(&rows);
                    }
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::AddUser {
                first_name,
                second_name,
            } => match repository.create_user(&first_name, second_name.as_deref()) {
                Ok(user) => cli_style::print_success(&format!(
                    "User {} created (id={}).",
                    user.display_name(),
                    user.user_id
                )),
                Err(err) => return command_failed(err),
            },
            InnerCommand::AddArtist {
                first_name,
                last_name,
            } => match repository.create_artist(&first_name, &last_name) {
                Ok(artist) => cli_style::print_success(&format!(
                    "Artist {} created (id={}).",
                    artist.display_name(),
                    artist.artist_id
                )),
                Err(err) => return command_failed(err),
            },
            InnerCommand::AddSong { name, genre } => {
                match repository.create_song(&name, genre.as_deref()) {
                    Ok(song) => cli_style::print_success(&format!(
                        "Song '{}' created (id={}).",
                        song.name, song.song_id
                    )),
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::AddPlan { name, price } => {
                match repository.create_plan(&name, price) {
                    Ok(plan) => cli_style::print_success(&format!(
                        "Plan '{}' created (id={}).",
                        plan.plan_name, plan.plan_id
                    )),
                    Err(err) => return command_failed(err),
                }
            }
            InnerCommand::Where => {
                println!("{}", db_path);
            }
            InnerCommand::Exit => return CommandExecutionResult::Exit,
        },

        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
        }
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct CommandHelper {
    commands_names: Vec<String>,
}

impl CommandHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        CommandHelper { commands_names }
    }
}

impl Completer for CommandHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for CommandHelper {}
impl Validator for CommandHelper {}
impl Helper for CommandHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli_args.db,
        log_filter: cli_args.log_filter,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_new(&config.log_filter)
                .with_context(|| format!("Invalid log filter '{}'", config.log_filter))?,
        )
        .try_init()
        .unwrap();

    let provider = ConnectionProvider::new(&config.db_path);
    provider.initialize()?;
    let db_path = provider.db_path().display().to_string();

    let executor = StatementExecutor::new(provider);
    let repository = CatalogRepository::new(executor.clone());
    let reports = ReportAggregator::new(executor);

    cli_style::print_welcome(&db_path);

    let editor_config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut rl = Editor::<CommandHelper, FileHistory>::with_config(editor_config)?;
    rl.set_helper(Some(CommandHelper::new()));

    let mut session = Session::default();

    loop {
        let readline = rl.readline(&cli_style::get_prompt());

        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &mut session, &repository, &reports, &db_path) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => break,
                    CommandExecutionResult::Warning(msg) => cli_style::print_warning(&msg),
                    CommandExecutionResult::Error(msg) => cli_style::print_error(&msg),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                cli_style::print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    cli_style::print_goodbye();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_cli_parses_every_command_shape() {
        let lines = [
            "login USER-AB12",
            "logout",
            "playlists",
            "add-playlist Road Trip",
            "add-songs PL_ABCD1234 SONG-0001 SONG-0002",
            "delete-playlist PL_ABCD1234 --yes",
            "artists",
            "songs",
            "following",
            "follow ARTIST-0001",
            "unfollow ARTIST-0001",
            "top-artists",
            "top-users",
            "top-genres",
            "top-followers",
            "avg-playlists",
            "view-table Playlist",
            "add-user Ada Lovelace",
            "add-artist Nick Cave",
            "add-song \"The Mercy Seat\" Rock",
            "add-plan Premium 9.99",
            "where",
            "exit",
        ];
        for line in lines {
            let args = shlex::split(line).unwrap();
            let parsed =
                InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));
            assert!(parsed.is_ok(), "failed to parse: {}", line);
        }
    }

    #[test]
    fn inner_cli_rejects_unknown_commands() {
        let parsed = InnerCli::try_parse_from([" ", "drop-everything"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn multi_word_playlist_names_collect_into_one_name() {
        let parsed = InnerCli::try_parse_from([" ", "add-playlist", "Road", "Trip"]).unwrap();
        match parsed.command {
            InnerCommand::AddPlaylist { name } => assert_eq!(name.join(" "), "Road Trip"),
            _ => panic!("wrong command"),
        }
    }
}
