#![forbid(unsafe_code)]

mod cmd;
mod output;
mod session;

use clap::{CommandFactory, Parser, Subcommand};
use huntdiff_core::config::CliOverrides;
use session::Session;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "huntdiff: label hunt results once, compare detection-rule runs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_name = "FORMAT")]
    format: Option<String>,

    /// API token for the hunting service (overrides SUBLIME_API_TOKEN).
    #[arg(long, global = true)]
    token: Option<String>,

    /// Directory holding hunt_data.json.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Replay saved upstream responses from DIR instead of calling the API.
    #[arg(long, global = true, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            json: self.json,
            format: self.format.clone(),
            token: self.token.clone(),
            data_dir: self.data_dir.clone(),
            snapshot_dir: self.snapshot_dir.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Hunts",
        about = "Import a completed hunt",
        long_about = "Fetch a completed hunt's results and metadata, add it to the registry, \
                      then reconcile every registered hunt.",
        after_help = "EXAMPLES:\n    # Add a hunt job by id\n    huntdiff add 7d1c9e --name \"baseline\"\n\n    # Replay saved responses instead of calling the API\n    huntdiff --snapshot-dir fixtures add 7d1c9e --name baseline"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Hunts",
        about = "Remove a hunt",
        long_about = "Remove a hunt from the registry. Its labels move to the first remaining \
                      hunt that contains the sample, or are dropped when none does.",
        after_help = "EXAMPLES:\n    # Delete a hunt\n    huntdiff delete 7d1c9e\n\n    # Emit machine-readable output\n    huntdiff delete 7d1c9e --json"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Hunts",
        about = "List registered hunts",
        long_about = "List registered hunts with their cached statistics.",
        after_help = "EXAMPLES:\n    # List hunts\n    huntdiff list\n\n    # Emit machine-readable output\n    huntdiff list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Hunts",
        about = "Show one hunt's samples",
        long_about = "Fetch a hunt's samples and show each with its label. Samples labeled \
                      while working on another hunt are hidden unless --all is given.",
        after_help = "EXAMPLES:\n    # Show unlabeled and own-labeled samples\n    huntdiff show 7d1c9e\n\n    # Include samples labeled in other hunts\n    huntdiff show 7d1c9e --all"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Labels",
        about = "Label one sample",
        long_about = "Label one sample as a true or false positive on behalf of a hunt.",
        after_help = "EXAMPLES:\n    # Mark a sample as a true positive\n    huntdiff categorize 7d1c9e m-123 tp\n\n    # Skip the fetch by giving the subject\n    huntdiff categorize 7d1c9e m-123 fp --subject \"Invoice\""
    )]
    Categorize(cmd::categorize::CategorizeArgs),

    #[command(
        next_help_heading = "Labels",
        about = "Label many samples of one hunt",
        long_about = "Label many samples of one hunt at once. Ids not in the hunt are reported \
                      and skipped.",
        after_help = "EXAMPLES:\n    # Mark three samples as false positives\n    huntdiff mass-categorize 7d1c9e fp m-1 m-2 m-3"
    )]
    MassCategorize(cmd::mass_categorize::MassCategorizeArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Compare two fully labeled hunts",
        long_about = "Compare a previous and a current hunt: shared, missing, and new true \
                      positives, eliminated false positives, a verdict, and a diff of the \
                      rule source.",
        after_help = "EXAMPLES:\n    # Compare two hunts\n    huntdiff compare 7d1c9e 91ab02\n\n    # Emit the rule diff as HTML\n    huntdiff compare 7d1c9e 91ab02 --html"
    )]
    Compare(cmd::compare::CompareArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Diff two rule sources",
        long_about = "Character diff of two files, or of two hunts' cached rule source.",
        after_help = "EXAMPLES:\n    # Diff two rule files\n    huntdiff diff old.yml new.yml\n\n    # Diff the rule source of two hunts\n    huntdiff diff --hunts 7d1c9e 91ab02"
    )]
    Diff(cmd::diff::DiffArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Reconcile all hunts",
        long_about = "Re-fetch every hunt, repair labels owned by deleted hunts, recompute \
                      statistics, and backfill missing metadata.",
        after_help = "EXAMPLES:\n    # Reprocess everything\n    huntdiff reprocess\n\n    # Emit machine-readable output\n    huntdiff reprocess --json"
    )]
    Reprocess(cmd::reprocess::ReprocessArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Remove all hunts and labels",
        long_about = "Remove every hunt and every label.",
        after_help = "EXAMPLES:\n    # Clear without prompting\n    huntdiff clear --force"
    )]
    Clear(cmd::clear::ClearArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    huntdiff completions bash\n\n    # Generate zsh completions\n    huntdiff completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose || env::var("DEBUG").is_ok() {
        "huntdiff=debug,info"
    } else {
        "huntdiff=info,warn"
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env("HUNTDIFF_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)));

    let format = env::var("HUNTDIFF_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let project_root = env::current_dir()?;
    let session = Session::open(&project_root, &cli.overrides())?;

    match &cli.command {
        Commands::Add(args) => cmd::add::run_add(args, &session),
        Commands::Delete(args) => cmd::delete::run_delete(args, &session),
        Commands::List(args) => cmd::list::run_list(args, &session),
        Commands::Show(args) => cmd::show::run_show(args, &session),
        Commands::Categorize(args) => cmd::categorize::run_categorize(args, &session),
        Commands::MassCategorize(args) => {
            cmd::mass_categorize::run_mass_categorize(args, &session)
        }
        Commands::Compare(args) => cmd::compare::run_compare(args, &session),
        Commands::Diff(args) => cmd::diff::run_diff(args, &session),
        Commands::Reprocess(args) => cmd::reprocess::run_reprocess(args, &session),
        Commands::Clear(args) => cmd::clear::run_clear(args, &session),
        Commands::Completions(_) => Ok(()),
    }
}
