use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dumpsearch::index::{self, Store};
use dumpsearch::output::{self, OutputOptions};
use dumpsearch::query::{self, Combine, MatchMode, Matcher, QueryOptions, SearchQuery};
use dumpsearch::utils::{default_store_path, AppConfig};
use dumpsearch::SearchError;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use termcolor::ColorChoice;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "dumpsearch")]
#[command(about = "Index an exported game-data tree and search it by substring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store file (defaults to the app data directory)
    #[arg(short, long, global = true, env = "DUMPSEARCH_STORE")]
    store: Option<PathBuf>,

    /// Config file (defaults to config.json in the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or refresh the store from an export directory
    Build {
        /// Root of the exported tree
        root: PathBuf,

        /// Glob selecting content files, relative to the root (repeatable)
        #[arg(long = "include", value_name = "GLOB")]
        include: Vec<String>,

        /// Documents per committed batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Content size in MB that forces an early commit
        #[arg(long)]
        max_batch_mb: Option<u64>,

        /// Delete the existing store and rebuild from scratch
        #[arg(short, long)]
        force: bool,

        /// Suppress progress bars and the build summary
        #[arg(short, long)]
        quiet: bool,
    },
    /// Search the store
    Query {
        /// Search term; multiple words are joined with single spaces
        #[arg(required = true, num_args = 1..)]
        term: Vec<String>,

        /// Match ASCII letters case-insensitively
        #[arg(short, long)]
        ignore_case: bool,

        /// Treat `*` and `?` as wildcards
        #[arg(short, long)]
        pattern: bool,

        /// Every whitespace-separated word must match
        #[arg(short, long, conflicts_with = "any")]
        all: bool,

        /// At least one whitespace-separated word must match
        #[arg(long)]
        any: bool,

        /// Maximum number of files to return
        #[arg(long)]
        limit: Option<usize>,

        /// Print only the paths of matching files
        #[arg(short = 'l', long)]
        files_with_matches: bool,

        /// Matching lines shown per file
        #[arg(long)]
        max_lines: Option<usize>,

        /// When to use colors
        #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
        color: ColorArg,

        /// Run a full integrity scan of the store first
        #[arg(long)]
        verify: bool,
    },
    /// Show store statistics
    Stats,
    /// Delete the store
    Remove,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl ColorArg {
    fn choice(self) -> ColorChoice {
        match self {
            ColorArg::Auto if std::io::stdout().is_terminal() => ColorChoice::Auto,
            ColorArg::Auto => ColorChoice::Never,
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            let code = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<SearchError>())
                .map(SearchError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "dumpsearch=debug"
    } else {
        "dumpsearch=warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let store_path = match cli.store {
        Some(path) => path,
        None => default_store_path()?,
    };

    match cli.command {
        Commands::Build {
            root,
            include,
            batch_size,
            max_batch_mb,
            force,
            quiet,
        } => {
            let mut index_config = config.index_config();
            if !include.is_empty() {
                index_config.include = include;
            }
            if let Some(size) = batch_size {
                index_config.batch_size = size.max(1);
            }
            if let Some(mb) = max_batch_mb {
                index_config.max_batch_bytes = mb.max(1) * 1024 * 1024;
            }
            index_config.force = force;
            index_config.silent = quiet;

            index::build_index(&root, &store_path, &index_config)
                .with_context(|| format!("failed to index {}", root.display()))?;
        }
        Commands::Query {
            term,
            ignore_case,
            pattern,
            all,
            any,
            limit,
            files_with_matches,
            max_lines,
            color,
            verify,
        } => {
            let options = QueryOptions {
                mode: if pattern {
                    MatchMode::Pattern
                } else {
                    MatchMode::Substring
                },
                combine: if all {
                    Combine::All
                } else if any {
                    Combine::Any
                } else {
                    Combine::Phrase
                },
                ignore_case,
                limit,
            };
            let query = SearchQuery::parse(&term.join(" "), options)?;
            let matcher = Matcher::new(&query)?;
            let results = query::search(&store_path, &query, verify)?;

            let output_options = OutputOptions {
                color: color.choice(),
                files_only: files_with_matches,
                max_lines: max_lines.unwrap_or(config.snippet_lines),
                max_columns: config.max_columns,
            };
            output::print_results(&results, &matcher, &output_options)?;
            if !files_with_matches {
                output::print_match_count(results.len());
            }
        }
        Commands::Stats => {
            index::stats::show_stats(&store_path)?;
        }
        Commands::Remove => {
            if Store::remove(&store_path)? {
                println!("Removed store: {}", store_path.display());
            } else {
                println!("No store at {}", store_path.display());
            }
        }
    }

    Ok(())
}
