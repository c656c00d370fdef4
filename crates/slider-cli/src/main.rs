#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use slider_core::ErrorCode;
use slider_core::config::{DB_ENV, load_config, resolve_db_path};
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "slider: manage banner sliders and their banner assignments",
    long_about = None
)]
struct Cli {
    /// Log at debug level (ignored when SLIDER_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides --json, FORMAT, and slider.toml).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Path to the slider database.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Create the slider store",
        long_about = "Create the slider database, or apply pending migrations to an existing one.",
        after_help = "EXAMPLES:\n    # Create .slider/slider.db in the current directory\n    slider init\n\n    # Use another location\n    slider --db /tmp/sliders.db init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        about = "Create a slider",
        long_about = "Create a slider, optionally assigning its first banners.",
        after_help = "EXAMPLES:\n    # Create a slider shown in every store\n    slider create --name \"Homepage\"\n\n    # Create a slider for stores 1 and 2 with two banners\n    slider create --name \"Promo\" --store 1,2 --banner 10:1 --banner 11:2\n\n    # Emit machine-readable output\n    slider create --name \"Homepage\" --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        about = "List sliders",
        long_about = "List sliders, most recently updated first.",
        after_help = "EXAMPLES:\n    # List every slider\n    slider list\n\n    # Only sliders visible in store 3\n    slider list --store 3"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Show a slider and its banners",
        long_about = "Show a slider with its banners ordered by position.",
        after_help = "EXAMPLES:\n    # Show slider 4\n    slider show 4\n\n    # Emit machine-readable output\n    slider show 4 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        about = "Replace the banners of a slider",
        long_about = "Replace the banner list of a slider. Banners not listed are removed; \
                      listed banners are inserted or moved; unchanged banners are not rewritten.",
        after_help = "EXAMPLES:\n    # Keep banners 10 and 12, in that order\n    slider assign 4 --banner 10:1 --banner 12:2\n\n    # Same, from a JSON payload\n    slider assign 4 --payload '{\"10\":{\"position\":1},\"12\":{\"position\":2}}'\n\n    # Preview without writing\n    slider assign 4 --banner 10:1 --dry-run\n\n    # Remove every banner\n    slider assign 4 --clear"
    )]
    Assign(cmd::assign::AssignArgs),

    #[command(
        about = "Find the sliders that carry a banner",
        after_help = "EXAMPLES:\n    # Which sliders show banner 10?\n    slider where 10"
    )]
    Where(cmd::where_cmd::WhereArgs),
}

/// Filter used when `SLIDER_LOG` is unset.
const fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "slider=debug,slider_core=debug,info"
    } else {
        "slider=info,slider_core=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let verbose = verbose || env::var("DEBUG").is_ok();
    let filter = EnvFilter::try_from_env("SLIDER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let format = env::var("SLIDER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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
    init_tracing(cli.verbose);
    debug!(command = ?cli.command, "starting");

    let project_root = env::current_dir()?;
    let config = match load_config(&project_root) {
        Ok(config) => config,
        Err(err) => {
            let code = ErrorCode::ConfigParseError;
            output::render_error(
                output::resolve_output_mode(cli.format, cli.json, None),
                &output::CliError::with_details(
                    format!("{err:#}"),
                    code.hint().unwrap_or_default(),
                    code.code(),
                ),
            )?;
            return Err(err);
        }
    };
    let env_db = env::var(DB_ENV).ok();
    let ctx = cmd::Context {
        db_path: resolve_db_path(&project_root, cli.db.as_deref(), env_db.as_deref(), &config),
        output: output::resolve_output_mode(cli.format, cli.json, config.output.format.as_deref()),
        store: config.store,
    };

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &ctx),
        Commands::Create(ref args) => cmd::create::run_create(args, &ctx),
        Commands::List(ref args) => cmd::list::run_list(args, &ctx),
        Commands::Show(ref args) => cmd::show::run_show(args, &ctx),
        Commands::Assign(ref args) => cmd::assign::run_assign(args, &ctx),
        Commands::Where(ref args) => cmd::where_cmd::run_where(args, &ctx),
    }
}
