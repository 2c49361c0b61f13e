//! ScriptGen CLI - Scripted access to the engine
//!
//! Commands: pages, cases, generate, copy, new-membership, scan, lint
//! Outputs JSON to stdout, logs to stderr
//! Exit codes: 1 = error, 2 = blocked by validation, 3 = placeholder values needed

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use scriptgen_core::{
    scan, Catalog, CopyOutcome, FileSink, Hub, ManualFamily, MemorySink, Membership,
    NewMembershipCase, ScriptEngine, ScriptKind, ScriptSink, Session, SessionInput, Settings,
    StaffLevel, StdoutSink, ENGINE_VERSION,
};

const EXIT_BLOCKED: u8 = 2;
const EXIT_NEEDS_VALUES: u8 = 3;

#[derive(Parser)]
#[command(name = "scriptgen-cli", version = ENGINE_VERSION)]
#[command(about = "ScriptGen CLI - Feature Script Generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding scripts.json and templates.json
    #[arg(long, global = true)]
    catalog_dir: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog pages
    Pages {
        /// Only pages of this hub
        #[arg(long)]
        hub: Option<String>,
    },

    /// List membership, staff level and new-membership labels for a hub
    Cases {
        #[arg(long)]
        hub: String,
    },

    /// Generate all scripts for a session
    Generate {
        /// Session JSON, or @path to a JSON file
        #[arg(short, long)]
        session: String,
    },

    /// Copy one script
    Copy {
        /// Session JSON, or @path to a JSON file
        #[arg(short, long)]
        session: String,

        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Copy with [[..]] and [{..}] placeholders left in place
        #[arg(long)]
        raw: bool,

        /// Short placeholder value, NAME=VALUE (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        short_values: Vec<String>,

        /// Long placeholder value, NAME=VALUE (repeatable)
        #[arg(long = "set-long", value_name = "NAME=VALUE")]
        long_values: Vec<String>,

        #[command(flatten)]
        delivery: DeliveryArgs,
    },

    /// Copy the new-membership script
    NewMembership {
        /// Session JSON, or @path to a JSON file
        #[arg(short, long)]
        session: String,

        #[command(flatten)]
        delivery: DeliveryArgs,
    },

    /// List manual placeholders in a text
    Scan {
        #[arg(short, long)]
        text: String,
    },

    /// Check every catalog template for unknown tokens
    Lint,
}

#[derive(clap::Args)]
struct DeliveryArgs {
    /// Write the script into this directory instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write the script into the configured export directory
    #[arg(long, conflicts_with = "out")]
    save: bool,

    /// Print only the script text
    #[arg(long, conflicts_with_all = ["out", "save"])]
    plain: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Feature,
    Comment,
    OriginalPost,
}

impl From<KindArg> for ScriptKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Feature => ScriptKind::Feature,
            KindArg::Comment => ScriptKind::Comment,
            KindArg::OriginalPost => ScriptKind::OriginalPost,
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(format!("Failed to serialize output: {e}")),
    }
}

fn fail(message: impl Into<String>) -> ExitCode {
    let output = serde_json::json!({ "success": false, "error": message.into() });
    println!("{output}");
    ExitCode::FAILURE
}

fn read_payload(payload: &str) -> Result<String, String> {
    match payload.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}")),
        None => Ok(payload.to_string()),
    }
}

fn load_session(payload: &str, settings: &Settings) -> Result<Session, String> {
    let mut input: SessionInput =
        serde_json::from_str(&read_payload(payload)?).map_err(|e| format!("Invalid session: {e}"))?;

    // Curator defaults from settings fill blank fields.
    if input.your_name.trim().is_empty() {
        input.your_name.clone_from(&settings.curator.your_name);
    }
    if input.your_first_name.trim().is_empty() {
        input.your_first_name.clone_from(&settings.curator.your_first_name);
    }
    if input.staff_level.is_none() {
        input.staff_level.clone_from(&settings.curator.staff_level);
    }

    Session::from_input(&input, settings.lists.clone()).map_err(|e| e.to_string())
}

fn load_catalog(settings: &Settings) -> Result<Catalog, String> {
    Catalog::load_from_files(&settings.catalog.scripts_path(), &settings.catalog.templates_path())
        .map_err(|e| e.to_string())
}

fn parse_assignments(values: &[String]) -> Result<Vec<(String, String)>, String> {
    values
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .ok_or_else(|| format!("Expected NAME=VALUE, got '{pair}'"))
        })
        .collect()
}

fn make_sink(delivery: &DeliveryArgs, settings: &Settings) -> Box<dyn ScriptSink> {
    match (&delivery.out, delivery.save, delivery.plain) {
        (Some(dir), _, _) => Box::new(FileSink::new(dir)),
        (None, true, _) => Box::new(FileSink::new(&settings.export.dir)),
        (None, false, true) => Box::new(StdoutSink),
        (None, false, false) => Box::new(MemorySink::new()),
    }
}

fn finish_copy(outcome: CopyOutcome, plain: bool) -> ExitCode {
    match outcome {
        CopyOutcome::Copied { .. } if plain => ExitCode::SUCCESS,
        CopyOutcome::Blocked { .. } => {
            print_json(&outcome);
            ExitCode::from(EXIT_BLOCKED)
        }
        CopyOutcome::EditorRequired(_) => {
            print_json(&outcome);
            ExitCode::from(EXIT_NEEDS_VALUES)
        }
        _ => print_json(&outcome),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => return fail(format!("Failed to load settings: {e}")),
    };
    if let Some(dir) = &cli.catalog_dir {
        settings.catalog.dir.clone_from(dir);
    }
    debug!(catalog_dir = %settings.catalog.dir.display(), "Settings ready");

    match run(cli.command, &settings) {
        Ok(code) => code,
        Err(message) => fail(message),
    }
}

fn run(command: Commands, settings: &Settings) -> Result<ExitCode, String> {
    match command {
        Commands::Pages { hub } => {
            let catalog = load_catalog(settings)?;
            let pages: Vec<_> = catalog
                .pages()
                .filter(|p| hub.as_deref().map_or(true, |h| p.hub == h))
                .map(|p| {
                    serde_json::json!({
                        "id": p.id(),
                        "hub": p.hub,
                        "name": p.display_name(),
                        "title": p.display_title(),
                        "hashTag": p.display_hash_tag(),
                    })
                })
                .collect();
            Ok(print_json(&pages))
        }

        Commands::Cases { hub } => {
            let hub = Hub::from_name(&hub);
            let memberships: Vec<_> =
                Membership::cases_for(hub).iter().map(|c| c.label()).collect();
            let staff_levels: Vec<_> =
                StaffLevel::cases_for(hub).iter().map(|c| c.label()).collect();
            let new_memberships: Vec<_> =
                NewMembershipCase::cases_for(hub).iter().map(|c| c.label()).collect();
            let output = serde_json::json!({
                "hub": hub,
                "memberships": memberships,
                "staffLevels": staff_levels,
                "newMemberships": new_memberships,
            });
            Ok(print_json(&output))
        }

        Commands::Generate { session } => {
            let engine = ScriptEngine::with_catalog(load_catalog(settings)?);
            let session = load_session(&session, settings)?;
            let output = engine.generate(&session);
            let code = print_json(&output);
            Ok(if output.can_copy { code } else { ExitCode::from(EXIT_BLOCKED) })
        }

        Commands::Copy { session, kind, raw, short_values, long_values, delivery } => {
            let engine = ScriptEngine::with_catalog(load_catalog(settings)?);
            let mut session = load_session(&session, settings)?;
            let kind = ScriptKind::from(kind);
            let mut sink = make_sink(&delivery, settings);

            let outcome = if raw {
                engine.copy_raw(&session, kind, sink.as_mut())
            } else {
                let short = parse_assignments(&short_values)?;
                let long = parse_assignments(&long_values)?;
                let families = [(ManualFamily::Short, &short), (ManualFamily::Long, &long)];
                for (family, values) in families {
                    let values = values.iter().map(|(n, v)| (n.as_str(), v.as_str()));
                    session.editor_save(kind, family, values);
                }
                engine.copy_resolved(&mut session, kind, sink.as_mut())
            }
            .map_err(|e| e.to_string())?;

            info!(%kind, raw, "Copy finished");
            Ok(finish_copy(outcome, delivery.plain))
        }

        Commands::NewMembership { session, delivery } => {
            let engine = ScriptEngine::with_catalog(load_catalog(settings)?);
            let session = load_session(&session, settings)?;
            let mut sink = make_sink(&delivery, settings);
            let outcome = engine
                .copy_new_membership(&session, sink.as_mut())
                .map_err(|e| e.to_string())?;
            Ok(finish_copy(outcome, delivery.plain))
        }

        Commands::Scan { text } => {
            let text = read_payload(&text)?;
            Ok(print_json(&scan(&text)))
        }

        Commands::Lint => {
            let catalog = load_catalog(settings)?;
            let lint = catalog.lint();
            let code = print_json(&lint);
            Ok(if lint.is_empty() { code } else { ExitCode::FAILURE })
        }
    }
}
