use std::collections::BTreeSet;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use degrees::{shortest_path, Connection, EntityId, GraphStore, Hop, LoadError};
use dialoguer::{Input, Select};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Find how many shared movies separate two people.
#[derive(Debug, Parser)]
#[command(name = "degrees", version)]
struct Cli {
    /// Directory holding people.csv, movies.csv and stars.csv
    #[arg(env = "DEGREES_DATA_DIR", default_value = "large")]
    directory: PathBuf,

    /// Name of the first person (prompted for when omitted)
    #[arg(long, conflicts_with = "source_id")]
    source: Option<String>,

    /// Name of the second person (prompted for when omitted)
    #[arg(long, conflicts_with = "target_id")]
    target: Option<String>,

    /// Id of the first person, skipping name lookup
    #[arg(long)]
    source_id: Option<String>,

    /// Id of the second person, skipping name lookup
    #[arg(long)]
    target_id: Option<String>,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Person not found: {name}.")]
    PersonNotFound { name: String },

    #[error("'{name}' matches several people: {candidates}; pass an id instead")]
    AmbiguousName { name: String, candidates: String },

    #[error("No person with id '{0}'.")]
    UnknownId(String),

    #[error("failed to read a name from stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(?err, "query failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    println!("Loading data...");
    let store = GraphStore::from_dir(&cli.directory)?;
    println!("Data loaded.");

    let source = pick_person(&store, cli.source.as_deref(), cli.source_id.as_deref())?;
    let target = pick_person(&store, cli.target.as_deref(), cli.target_id.as_deref())?;

    match shortest_path(&store, &source, &target) {
        Connection::NotConnected => println!("Not connected."),
        Connection::Path(hops) => print_path(&store, &source, &hops),
    }
    Ok(())
}

fn pick_person(store: &GraphStore, name: Option<&str>, id: Option<&str>) -> Result<EntityId, CliError> {
    if let Some(id) = id {
        let id = EntityId::from(id);
        if !store.contains_entity(&id) {
            return Err(CliError::UnknownId(id.to_string()));
        }
        return Ok(id);
    }

    let name = match name {
        Some(name) => name.to_string(),
        None => ask_name()?,
    };
    let mut candidates = store.resolve(&name);
    match candidates.len() {
        0 => Err(CliError::PersonNotFound { name }),
        1 => candidates.pop_first().ok_or(CliError::PersonNotFound { name }),
        _ => disambiguate(store, name, candidates),
    }
}

fn ask_name() -> Result<String, CliError> {
    if io::stdin().is_terminal() {
        return Ok(Input::<String>::new().with_prompt("Name").interact_text()?);
    }

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).map_err(CliError::Stdin)?;
    Ok(line.trim().to_string())
}

/// Lets the user choose among people sharing `name`.
///
/// Without a terminal there is nobody to ask, so the candidates are
/// reported instead.
fn disambiguate(store: &GraphStore, name: String, candidates: BTreeSet<EntityId>) -> Result<EntityId, CliError> {
    if !io::stdin().is_terminal() {
        let candidates = candidates.iter().map(EntityId::as_str).collect::<Vec<_>>().join(", ");
        return Err(CliError::AmbiguousName { name, candidates });
    }

    let candidates: Vec<EntityId> = candidates.into_iter().collect();
    let items: Vec<String> = candidates
        .iter()
        .map(|id| {
            let (person, birth) = store
                .entity(id)
                .map_or(("", ""), |e| (e.name.as_str(), e.birth.as_deref().unwrap_or("")));
            format!("ID: {id}, Name: {person}, Birth: {birth}")
        })
        .collect();

    let choice = Select::new()
        .with_prompt(format!("Which '{name}'?"))
        .items(&items)
        .default(0)
        .interact()?;
    candidates
        .into_iter()
        .nth(choice)
        .ok_or(CliError::PersonNotFound { name })
}

fn print_path(store: &GraphStore, source: &EntityId, hops: &[Hop]) {
    println!("{} degrees of separation.", hops.len());

    let mut previous = source;
    for (i, hop) in hops.iter().enumerate() {
        let title = store.work(&hop.work).map_or(hop.work.as_str(), |w| w.title.as_str());
        println!(
            "{}: {} and {} starred in {}",
            i + 1,
            display_name(store, previous),
            display_name(store, &hop.entity),
            title
        );
        previous = &hop.entity;
    }
}

fn display_name<'a>(store: &'a GraphStore, id: &'a EntityId) -> &'a str {
    store.entity(id).map_or(id.as_str(), |e| e.name.as_str())
}
