//! Shelf CLI
//!
//! Command-line interface for Shelf - a personal book catalog.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use shelf_core::query::{MatchType, ReadFilter, SearchField, SearchQuery, SortKey};
use shelf_core::transfer::Format;
use shelf_core::{Config, Store};

mod commands;
mod editor;
mod output;

use commands::book::BookFields;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Shelf - Personal book catalog")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book
    Add {
        /// Book title
        title: String,
        /// Book author
        #[arg(short, long)]
        author: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// List books
    #[command(alias = "ls")]
    List {
        /// Filter by read status
        #[arg(short, long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        /// Sort by title, author, year, genre, or date-added
        #[arg(short, long, default_value = "title")]
        sort: SortKey,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Show at most this many books
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show book details
    Show {
        /// Book ID (full ID or prefix)
        id: String,
    },
    /// Edit a book (prompts for each field when no flags are given)
    Edit {
        /// Book ID (full ID or prefix)
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New author
        #[arg(short, long)]
        author: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a book
    #[command(alias = "rm")]
    Delete {
        /// Book ID (full ID or prefix)
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Mark a book as read
    Read {
        /// Book ID (full ID or prefix)
        id: String,
    },
    /// Search books
    Search {
        /// Search term
        term: String,
        /// Field to search
        #[arg(short, long, value_enum, default_value_t = FieldArg::All)]
        by: FieldArg,
        /// Match the whole field instead of a substring
        #[arg(long)]
        exact: bool,
        /// Match case
        #[arg(short, long)]
        case_sensitive: bool,
    },
    /// Show recently added books
    Recent {
        /// Number of books
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
    /// Manage collections
    #[command(alias = "col")]
    Collection {
        #[command(subcommand)]
        command: CollectionCommands,
    },
    /// Manage the reading list
    Reading {
        #[command(subcommand)]
        command: ReadingCommands,
    },
    /// Show library statistics
    Stats,
    /// Show storage status and a summary of the library
    Status,
    /// Create, list, and restore backups
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
    /// Export books to JSON or CSV
    Export {
        /// Output format (defaults to the file extension, then JSON)
        #[arg(short, long)]
        format: Option<Format>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import books from JSON or CSV
    Import {
        /// File to import
        path: PathBuf,
        /// Input format (defaults to the file extension)
        #[arg(short, long)]
        format: Option<Format>,
    },
    /// Delete all books, collections, and the reading list
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// Optional book fields shared by add and edit
#[derive(Args, Debug, Default)]
struct FieldArgs {
    /// Publication year
    #[arg(short, long)]
    year: Option<u32>,
    /// Genre
    #[arg(short, long)]
    genre: Option<String>,
    /// Rating from 0 to 5
    #[arg(short, long)]
    rating: Option<u8>,
    /// Mark as read
    #[arg(long, conflicts_with = "unread")]
    read: bool,
    /// Mark as unread
    #[arg(long)]
    unread: bool,
    /// Notes
    #[arg(long)]
    notes: Option<String>,
    /// ISBN
    #[arg(long)]
    isbn: Option<String>,
    /// Comma-separated tags
    #[arg(short, long)]
    tags: Option<String>,
}

impl FieldArgs {
    fn into_fields(self, title: Option<String>, author: Option<String>) -> BookFields {
        let read = match (self.read, self.unread) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        BookFields {
            title,
            author,
            year: self.year,
            genre: self.genre,
            rating: self.rating,
            read,
            notes: self.notes,
            isbn: self.isbn,
            tags: self.tags,
        }
    }
}

#[derive(Subcommand)]
enum CollectionCommands {
    /// Create a collection
    Create {
        /// Collection name
        name: String,
    },
    /// Delete a collection
    #[command(alias = "rm")]
    Delete {
        /// Collection name
        name: String,
    },
    /// Add a book to a collection
    Add {
        /// Collection name
        name: String,
        /// Book ID (full ID or prefix)
        id: String,
    },
    /// Remove a book from a collection
    Remove {
        /// Collection name
        name: String,
        /// Book ID (full ID or prefix)
        id: String,
    },
    /// List collections
    #[command(alias = "ls")]
    List,
    /// Show the books in a collection
    Show {
        /// Collection name
        name: String,
    },
    /// Delete every collection
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ReadingCommands {
    /// Add a book to the reading list
    Add {
        /// Book ID (full ID or prefix)
        id: String,
    },
    /// Remove a book from the reading list
    #[command(alias = "rm")]
    Remove {
        /// Book ID (full ID or prefix)
        id: String,
    },
    /// Show the reading list
    #[command(alias = "ls")]
    List,
    /// Mark a book as read and take it off the list
    Done {
        /// Book ID (full ID or prefix)
        id: String,
    },
    /// Mark every book on the list as read
    DoneAll,
    /// Empty the reading list
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum BackupCommands {
    /// Write a timestamped backup
    Create,
    /// List backups, newest first
    #[command(alias = "ls")]
    List,
    /// Restore a backup (the newest when no path is given)
    Restore {
        /// Backup file
        path: Option<PathBuf>,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backup_dir, atomic_writes, log_file)
        key: String,
        /// Configuration value ("none" clears optional keys)
        value: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FilterArg {
    All,
    Read,
    Unread,
}

impl From<FilterArg> for ReadFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => ReadFilter::All,
            FilterArg::Read => ReadFilter::Read,
            FilterArg::Unread => ReadFilter::Unread,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FieldArg {
    Title,
    Author,
    Genre,
    Tags,
    All,
}

impl From<FieldArg> for SearchField {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::Title => SearchField::Title,
            FieldArg::Author => SearchField::Author,
            FieldArg::Genre => SearchField::Genre,
            FieldArg::Tags => SearchField::Tags,
            FieldArg::All => SearchField::All,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let mut store = Store::open_with_config(config)?;
    debug!("Using library {:?}", store.config().library_path());

    let Some(command) = cli.command else {
        return commands::status::show(&store, &output);
    };

    let result = match command {
        Commands::Add {
            title,
            author,
            fields,
        } => commands::book::add(
            &mut store,
            fields.into_fields(Some(title), Some(author)),
            &output,
        ),
        Commands::List {
            filter,
            sort,
            desc,
            limit,
        } => commands::book::list(&store, filter.into(), sort, desc, limit, &output),
        Commands::Show { id } => commands::book::show(&store, id, &output),
        Commands::Edit {
            id,
            title,
            author,
            fields,
        } => commands::book::edit(&mut store, id, fields.into_fields(title, author), &output),
        Commands::Delete { id, yes } => commands::book::delete(&mut store, id, yes, &output),
        Commands::Read { id } => commands::book::mark_read(&mut store, id, &output),
        Commands::Search {
            term,
            by,
            exact,
            case_sensitive,
        } => {
            let query = SearchQuery {
                field: by.into(),
                match_type: if exact {
                    MatchType::Exact
                } else {
                    MatchType::Contains
                },
                case_sensitive,
                ..SearchQuery::new(term)
            };
            commands::book::search(&store, query, &output)
        }
        Commands::Recent { count } => commands::book::recent(&store, count, &output),
        Commands::Collection { command } => handle_collection_command(command, &mut store, &output),
        Commands::Reading { command } => handle_reading_command(command, &mut store, &output),
        Commands::Stats => commands::stats::show(&store, &output),
        Commands::Status => commands::status::show(&store, &output),
        Commands::Backup { command } => handle_backup_command(command, &mut store, &output),
        Commands::Export {
            format,
            output: path,
        } => commands::transfer::export(&store, format, path, &output),
        Commands::Import { path, format } => {
            commands::transfer::import(&mut store, path, format, &output)
        }
        Commands::Reset { yes } => reset(&mut store, yes, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    if store.is_dirty() {
        output.warning("Changes are held in memory but could not be written to disk.");
    }

    result
}

fn handle_collection_command(
    command: CollectionCommands,
    store: &mut Store,
    output: &Output,
) -> Result<()> {
    match command {
        CollectionCommands::Create { name } => commands::collection::create(store, name, output),
        CollectionCommands::Delete { name } => commands::collection::delete(store, name, output),
        CollectionCommands::Add { name, id } => commands::collection::add(store, name, id, output),
        CollectionCommands::Remove { name, id } => {
            commands::collection::remove(store, name, id, output)
        }
        CollectionCommands::List => commands::collection::list(store, output),
        CollectionCommands::Show { name } => commands::collection::show(store, name, output),
        CollectionCommands::Clear { yes } => commands::collection::clear(store, yes, output),
    }
}

fn handle_reading_command(
    command: ReadingCommands,
    store: &mut Store,
    output: &Output,
) -> Result<()> {
    match command {
        ReadingCommands::Add { id } => commands::reading::add(store, id, output),
        ReadingCommands::Remove { id } => commands::reading::remove(store, id, output),
        ReadingCommands::List => commands::reading::list(store, output),
        ReadingCommands::Done { id } => commands::book::mark_read(store, id, output),
        ReadingCommands::DoneAll => commands::reading::done_all(store, output),
        ReadingCommands::Clear { yes } => commands::reading::clear(store, yes, output),
    }
}

fn handle_backup_command(command: BackupCommands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        BackupCommands::Create => commands::backup::create(store, output),
        BackupCommands::List => commands::backup::list(store, output),
        BackupCommands::Restore { path, yes } => {
            commands::backup::restore(store, path, yes, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

fn reset(store: &mut Store, yes: bool, output: &Output) -> Result<()> {
    if !yes && output.should_prompt() {
        println!(
            "This deletes {} book(s), {} collection(s), and the reading list.",
            store.books().len(),
            store.library().collections().len()
        );
        if !editor::confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }
    store.reset()?;
    output.success("Library reset");
    Ok(())
}

/// Initialize logging
///
/// Logs go to `config.log_file` when set, otherwise to stderr. `RUST_LOG`
/// overrides the default level (`warn`, or `debug` with --verbose).
fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shelf_core={0},shelf_cli={0}", level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    // Ignore the error if a subscriber is already set
    match &config.log_file {
        Some(log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
