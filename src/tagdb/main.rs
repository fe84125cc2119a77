//! # Tagdb CLI
//!
//! The binary is intentionally thin: argument definitions live in `args.rs`,
//! each subcommand gets one handler below, and the library does the real
//! work. This file is the ONLY place that prints, reads stdin, or exits;
//! everything from the `tagdb` crate inward returns `Result` and stays
//! silent.
//!
//! Failure kinds map to distinct exit codes so scripts can tell them apart:
//!
//! | Code | Failure |
//! |------|---------|
//! | 1    | database file already exists |
//! | 2    | name already registered |
//! | 3    | registered database file missing on disk |
//! | 4    | database name not registered |
//! | 5    | mutually exclusive flags |
//! | 7    | tag not in the allowed list |
//! | 8    | invalid KEY:VALUE attribute |
//! | 9    | entry index out of range |
//! | 10   | no match found / invalid index |
//! | 11   | I/O or serialization failure |
//! | 12   | `format` got neither --indices nor piped stdin |
//! | 13   | corrupt database file |

use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use tagdb::config;
use tagdb::error::{Result, TagdbError};
use tagdb::format::{Template, DEFAULT_FORMAT};
use tagdb::model::{AttrValue, Attrs};
use tagdb::registry::Registry;
use tagdb::store::{self, BackupPolicy, Session};

mod args;
use args::{Cli, Commands, EditArgs, FormatArgs, IdArgs, InfoSubject, ModifyArgs, SetArgs};

const EXIT_NO_INDICES: i32 = 12;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {}", "[ERROR]".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(err: &TagdbError) -> i32 {
    match err {
        TagdbError::AlreadyExists(_) => 1,
        TagdbError::AlreadyRegistered(_) => 2,
        TagdbError::DatabaseMissing(_) => 3,
        TagdbError::NotRegistered(_) => 4,
        TagdbError::MutuallyExclusive(_, _) => 5,
        TagdbError::TagsNotAllowed(_) => 7,
        TagdbError::InvalidAttribute(_) => 8,
        TagdbError::IndexOutOfRange(_) => 9,
        TagdbError::NoMatch(_) | TagdbError::InvalidIndex(_) => 10,
        TagdbError::Io(_) | TagdbError::Serialization(_) => 11,
        TagdbError::Corrupt { .. } => 13,
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { name, path } => handle_init(&name, path),
        Commands::Info { name, subject } => handle_info(&name, subject),
        Commands::Modify(args) => handle_modify(args),
        Commands::AddDb { path } => handle_add_db(&path),
        Commands::RmDb { name } => registry().unregister(&name),
        Commands::Dbs => handle_dbs(),
        Commands::Set(args) => handle_set(args),
        Commands::Unset { name, index } => handle_unset(&name, index),
        Commands::Edit(args) => handle_edit(args),
        Commands::Id(args) => handle_id(args),
        Commands::Query { name, filters } => handle_query(&name, &filters),
        Commands::Format(args) => handle_format(args),
    }
}

fn registry() -> Registry {
    Registry::new(config::tagdb_home())
}

/// Resolve a name through the registry and open a session on it, surfacing
/// any advisory warnings the open collected.
fn open_named(name: &str) -> Result<Session> {
    let path = registry().resolve(name)?;
    let session = Session::open(&path, BackupPolicy::Required)?;
    print_warnings(session.warnings());
    Ok(session)
}

fn print_warnings(warnings: &[String]) {
    if config::suppress_warnings() {
        return;
    }
    for warning in warnings {
        eprintln!("{} {}", "[WARNING]".yellow().bold(), warning);
    }
}

fn handle_init(name: &str, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or_else(config::tagdb_home);
    let path = store::create(name, &dir)?;
    let registry = registry();
    registry.init(false)?;
    registry.register(&path)?;
    println!("Initialized database {} at {}", name, path.display());
    Ok(())
}

fn handle_info(name: &str, subject: Option<InfoSubject>) -> Result<()> {
    let session = open_named(name)?;
    let doc = session.document();
    let message = match subject {
        Some(InfoSubject::Tags) => doc.tags.join(", "),
        Some(InfoSubject::Size) => doc.len().to_string(),
        Some(InfoSubject::Bytes) => doc.byte_size()?.to_string(),
        Some(InfoSubject::Path) => session.path().display().to_string(),
        Some(InfoSubject::BackupsEnabled) => doc.backups_enabled.to_string(),
        Some(InfoSubject::EnforceTags) => doc.enforce_tags.to_string(),
        None => format!(
            "Tags: {}\nSize: {}\nBytes: {}\nPath: {}\nBackups enabled: {}\nTags enforced: {}",
            doc.tags.join(", "),
            doc.len(),
            doc.byte_size()?,
            session.path().display(),
            doc.backups_enabled,
            doc.enforce_tags,
        ),
    };
    session.close()?;
    println!("{}", message);
    Ok(())
}

fn handle_modify(args: ModifyArgs) -> Result<()> {
    if args.enforce_tags && args.no_enforce_tags {
        return Err(TagdbError::MutuallyExclusive(
            "--enforce-tags",
            "--no-enforce-tags",
        ));
    }
    if args.enable_backups && args.disable_backups {
        return Err(TagdbError::MutuallyExclusive(
            "--enable-backups",
            "--disable-backups",
        ));
    }
    if !args.add_tags.is_empty() && args.clear_tags && !config::suppress_warnings() {
        eprintln!(
            "{} --add-tag will be overridden by --clear-tags. Suppress this \
             warning by setting the {} environment variable to 1.",
            "[WARNING]".yellow().bold(),
            config::SUPPRESS_WARNINGS_ENV,
        );
    }

    let mut session = open_named(&args.name)?;
    let doc = session.document_mut();
    doc.add_tags(args.add_tags);
    doc.remove_tags(&args.rm_tags);
    if args.clear_tags {
        doc.clear_tags();
    }
    if args.enforce_tags {
        doc.enforce_tags = true;
    }
    if args.no_enforce_tags {
        doc.enforce_tags = false;
    }
    if args.enable_backups {
        doc.backups_enabled = true;
    }
    if args.disable_backups {
        doc.backups_enabled = false;
    }
    session.close()
}

fn handle_add_db(path: &Path) -> Result<()> {
    let registry = registry();
    registry.init(false)?;
    registry.register(path)
}

fn handle_dbs() -> Result<()> {
    for path in registry().list()? {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_set(args: SetArgs) -> Result<()> {
    let attrs = parse_attrs(&args.attrs)?;
    let mut session = open_named(&args.name)?;
    session.document_mut().set_entry(args.data, args.tags, attrs)?;
    session.close()
}

fn handle_unset(name: &str, index: i64) -> Result<()> {
    let mut session = open_named(name)?;
    session.document_mut().unset_entry(index)?;
    session.close()
}

fn handle_edit(args: EditArgs) -> Result<()> {
    let tags = if args.tags.is_empty() {
        None
    } else {
        Some(args.tags)
    };
    let attrs = if args.attrs.is_empty() {
        None
    } else {
        Some(parse_attrs(&args.attrs)?)
    };
    let mut session = open_named(&args.name)?;
    session
        .document_mut()
        .edit_entry(args.index, args.data, tags, attrs)?;
    session.close()
}

fn handle_id(args: IdArgs) -> Result<()> {
    let session = open_named(&args.name)?;
    let index = session
        .document()
        .find_first(&args.data, args.contains, args.case_insensitive)?;
    session.close()?;
    println!("{}", index);
    Ok(())
}

fn handle_query(name: &str, filters: &[String]) -> Result<()> {
    let session = open_named(name)?;
    let indices = session.document().query(filters);
    session.close()?;
    let joined: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
    println!("{}", joined.join(","));
    Ok(())
}

fn handle_format(args: FormatArgs) -> Result<()> {
    let raw_indices = match args.indices {
        Some(indices) => indices,
        None => {
            if std::io::stdin().is_terminal() {
                eprintln!(
                    "{} Either use the --indices flag or pipe input through stdin.",
                    "[ERROR]".red().bold(),
                );
                std::process::exit(EXIT_NO_INDICES);
            }
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    let mut ids = Vec::new();
    for token in raw_indices.split(',') {
        let token = token.trim();
        let id = token
            .parse::<i64>()
            .map_err(|_| TagdbError::InvalidIndex(token.to_string()))?;
        ids.push(id);
    }

    let template = Template::parse(args.format.as_deref().unwrap_or(DEFAULT_FORMAT));
    let session = open_named(&args.name)?;
    let output = template.render(session.document(), &ids, args.use_real_ids)?;
    session.close()?;
    println!("{}", output);
    Ok(())
}

fn parse_attrs(raw: &[String]) -> Result<Attrs> {
    let mut attrs = Attrs::new();
    for entry in raw {
        let Some((key, value)) = entry.split_once(':') else {
            return Err(TagdbError::InvalidAttribute(entry.clone()));
        };
        attrs.insert(key.to_string(), AttrValue::parse(value));
    }
    Ok(attrs)
}
