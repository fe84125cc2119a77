use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tagdb", version)]
#[command(about = "Manage small, handy JSON-backed databases")]
#[command(after_help = "Supported environment variables:\n  \
    TAGDB_HOME                 Override the data/registry directory\n  \
    TAGDB_SUPPRESS_WARNINGS    Suppress all advisory warnings\n  \
    TAGDB_BACKUP_KEEP_COUNT    How many backups to keep per database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new database and register it
    Init {
        /// The database name (without the .tagdb extension)
        name: String,

        /// The directory where the database file should be created
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Show information about a database
    Info {
        /// The name of the database
        name: String,

        /// Report a single subject instead of everything
        #[arg(short, long, value_enum)]
        subject: Option<InfoSubject>,
    },

    /// Change database settings and the allowed-tag list
    Modify(ModifyArgs),

    /// Register an existing database file
    #[command(name = "add-db")]
    AddDb {
        /// The full path to the .tagdb file
        path: PathBuf,
    },

    /// Remove a database from the registry (the file itself is kept)
    #[command(name = "rm-db")]
    RmDb {
        /// The database name (file stem)
        name: String,
    },

    /// List all registered databases, one per line
    Dbs,

    /// Append a new entry to a database
    Set(SetArgs),

    /// Delete an entry by its index
    Unset {
        /// The name of the database
        name: String,

        /// The index of the entry to delete; negative counts from the end
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },

    /// Edit an entry in place; omitted fields keep their previous value
    Edit(EditArgs),

    /// Print the index of the first entry matching DATA
    Id(IdArgs),

    /// Print the indices of all entries carrying every filter tag
    Query {
        /// The name of the database
        name: String,

        /// A tag to filter by; may be used multiple times
        #[arg(short, long = "filter", value_name = "TAG")]
        filters: Vec<String>,
    },

    /// Render entries through a format string, one line per index
    Format(FormatArgs),
}

#[derive(Args, Debug)]
pub struct ModifyArgs {
    /// The name of the database
    pub name: String,

    /// Add a tag to the allowed list; may be used multiple times
    #[arg(short = 't', long = "add-tag", value_name = "TAG")]
    pub add_tags: Vec<String>,

    /// Remove a tag from the allowed list; may be used multiple times
    #[arg(short = 'r', long = "rm-tag", value_name = "TAG")]
    pub rm_tags: Vec<String>,

    /// Clear the allowed-tag list
    #[arg(long)]
    pub clear_tags: bool,

    /// Reject entry tags that are missing from the allowed list
    #[arg(long)]
    pub enforce_tags: bool,

    /// Stop enforcing the allowed list
    #[arg(long)]
    pub no_enforce_tags: bool,

    /// Back up the database file on every open
    #[arg(long)]
    pub enable_backups: bool,

    /// Stop making backups
    #[arg(long)]
    pub disable_backups: bool,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// The name of the database
    pub name: String,

    /// The entry text
    pub data: String,

    /// A tag to assign to the entry; may be used multiple times
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// A KEY:VALUE attribute; VALUE coerces to integer, float, boolean or
    /// string. May be used multiple times
    #[arg(short, long = "attr", value_name = "KEY:VALUE")]
    pub attrs: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// The name of the database
    pub name: String,

    /// The index of the entry to edit; negative counts from the end
    #[arg(allow_negative_numbers = true)]
    pub index: i64,

    /// The new entry text
    #[arg(short, long)]
    pub data: Option<String>,

    /// A replacement tag; previous tags are dropped. May be used multiple times
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// A replacement KEY:VALUE attribute; previous attributes are dropped.
    /// May be used multiple times
    #[arg(short, long = "attr", value_name = "KEY:VALUE")]
    pub attrs: Vec<String>,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// The name of the database
    pub name: String,

    /// The entry text to search for
    pub data: String,

    /// Match when DATA is a substring of the entry
    #[arg(short, long)]
    pub contains: bool,

    /// Compare case-insensitively
    #[arg(short = 'i', long)]
    pub case_insensitive: bool,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// The name of the database
    pub name: String,

    /// Comma-separated indices; read from stdin when omitted, so `query`
    /// output can be piped in
    #[arg(short, long)]
    pub indices: Option<String>,

    /// The format string (%id, %data, %tags and %attrs macros)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Embed the database indices instead of counting lines from 0
    #[arg(long)]
    pub use_real_ids: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum InfoSubject {
    Tags,
    Size,
    Bytes,
    Path,
    BackupsEnabled,
    EnforceTags,
}
