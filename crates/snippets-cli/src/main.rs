use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use snippets_host::DylibBackend;
use snippets_registry::{Catalog, InterfaceEntry, Loader, LoaderConfig, ReloadReport};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "snippets", author, version, about = "Browse and run snippet libraries")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Library root to scan; replaces the configured roots when given
    #[arg(long = "root", value_name = "DIR", global = true)]
    roots: Vec<PathBuf>,
    /// Library file extension
    #[arg(long, value_name = "EXT", global = true)]
    extension: Option<String>,
    /// JSON configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List interfaces grouped by category
    List {
        /// Regular expression matched against display names
        pattern: Option<String>,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show the details of one interface
    Show { name: String },
    /// Execute an interface
    Run { name: String },
    /// Load every library and report problems
    Check,
    /// Interactive prompt supporting filter, run, reload and quit
    Shell,
}

#[derive(Serialize)]
struct GroupListing<'a> {
    category: &'a str,
    entries: Vec<&'a InterfaceEntry>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let config = resolve_config(&cli.source)?;
    debug!("library roots: {:?}", config.roots);
    let backend = DylibBackend::new(config.extension.clone());
    let mut loader = Loader::new(config, backend);

    match cli.command {
        Commands::List {
            pattern,
            case_sensitive,
            json,
        } => {
            let report = loader.load()?;
            print_warnings(&report);
            list(loader.catalog(), pattern.as_deref().unwrap_or(""), !case_sensitive, json)
        }
        Commands::Show { name } => {
            print_warnings(&loader.load()?);
            show(&loader, &name)
        }
        Commands::Run { name } => {
            print_warnings(&loader.load()?);
            loader
                .invoke(&name)
                .with_context(|| format!("failed to run '{name}'"))
        }
        Commands::Check => check(&mut loader),
        Commands::Shell => shell(&mut loader),
    }
}

/// Configuration file first, then command line overrides.
fn resolve_config(args: &SourceArgs) -> Result<LoaderConfig> {
    let mut config = match &args.config {
        Some(path) => LoaderConfig::from_file(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?,
        None => match LoaderConfig::default_path().filter(|path| path.is_file()) {
            Some(path) => LoaderConfig::from_file(&path)
                .with_context(|| format!("failed to read configuration {}", path.display()))?,
            None => LoaderConfig::default(),
        },
    };
    if !args.roots.is_empty() {
        config.roots = args.roots.clone();
    }
    if let Some(extension) = &args.extension {
        config.extension = extension.clone();
    }
    Ok(config)
}

fn print_warnings(report: &ReloadReport) {
    for root in &report.missing_roots {
        eprintln!("warning: library root {} does not exist", root.display());
    }
    for failure in &report.resolution.failures {
        eprintln!("warning: {}: {}", failure.module, failure.error);
    }
    for module in &report.resolution.without_interfaces {
        eprintln!("warning: {module}: no interfaces exported");
    }
    for module in &report.retained {
        eprintln!("warning: {module}: keeping previously loaded version");
    }
}

fn list(catalog: &Catalog, pattern: &str, case_insensitive: bool, json: bool) -> Result<()> {
    let filter = catalog.filter_with(pattern, case_insensitive)?;
    if json {
        let groups: Vec<_> = filter
            .groups()
            .map(|group| GroupListing {
                category: group.name,
                entries: group.entries,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    for group in filter.groups() {
        writeln!(stdout, "{}", group.name)?;
        for entry in group.entries {
            writeln!(stdout, "  {}", entry.display_name)?;
        }
    }
    Ok(())
}

fn show(loader: &Loader<DylibBackend>, name: &str) -> Result<()> {
    let Some((entry, record)) = loader.describe(name) else {
        bail!("no interface named '{name}'");
    };
    println!("{}", entry.display_name);
    println!("  symbol:   {}", entry.raw_name);
    println!("  category: {}", entry.category);
    println!("  module:   {}", record.name());
    println!("  path:     {}", record.path().display());
    if let Some(imported_at) = record.imported_at() {
        println!("  loaded:   {}", imported_at.to_rfc3339());
    }
    if let Some(description) = &entry.description {
        println!();
        println!("{description}");
    }
    Ok(())
}

fn check(loader: &mut Loader<DylibBackend>) -> Result<()> {
    let report = loader.load()?;
    print_warnings(&report);
    println!(
        "{} libraries, {} interfaces",
        report.registered,
        loader.catalog().len()
    );
    if !report.resolution.is_clean() {
        bail!(
            "{} libraries failed to load",
            report.resolution.failures.len()
        );
    }
    Ok(())
}

fn shell(loader: &mut Loader<DylibBackend>) -> Result<()> {
    match loader.load() {
        Ok(report) => print_warnings(&report),
        Err(err) => eprintln!("error: {err}"),
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("snippets> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let (command, argument) = match line.trim().split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (line.trim(), ""),
        };
        let outcome = match command {
            "" => Ok(()),
            "quit" | "exit" => break,
            "filter" | "list" => list(loader.catalog(), argument, true, false),
            "run" => loader.invoke(argument).map_err(Into::into),
            "show" => show(loader, argument),
            "reload" => loader.reload().map(|report| print_warnings(&report)).map_err(Into::into),
            other => Err(anyhow::anyhow!(
                "unknown command '{other}' (filter, show, run, reload, quit)"
            )),
        };
        if let Err(err) = outcome {
            eprintln!("error: {err:#}");
        }
    }
    Ok(())
}
