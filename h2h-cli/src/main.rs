mod config;
mod output;
mod racetime;

use std::cell::RefCell;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::Parser;
use h2h_core::{CategoryInfo, CategorySource, MatchupBoard, SessionOutcome};
use reqwest::Client;
use tracing::{info, warn, Level};

use crate::config::H2hConfig;
use crate::racetime::{RacetimeClient, DEFAULT_BASE_URL};

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "h2h", version, about = "Head-to-head records for racetime.gg categories")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Load a category and print the head-to-head table for one goal
    Table(TableArgs),
    /// Load a category and list its goals with race counts
    Goals(LoadArgs),
    /// Check whether a category slug exists
    Check(CheckArgs),
    /// Create a default config file (at ~/.config/h2h/config.toml unless --config is given)
    Init(InitArgs),
}

#[derive(clap::Args)]
struct CommonArgs {
    /// racetime.gg base URL (default: https://racetime.gg)
    #[arg(long)]
    base_url: Option<String>,

    /// Path to config file (default: ~/.config/h2h/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show progress during execution
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args)]
struct LoadArgs {
    /// Category slug (e.g. lozssr, twwr)
    slug: String,

    /// Only use races that ended on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<String>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args)]
struct TableArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Goal to build the table for (falls back to the config file)
    #[arg(long)]
    goal: Option<String>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct InitArgs {
    /// Where to write the config file (default: ~/.config/h2h/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Category slug
    slug: String,

    #[command(flatten)]
    common: CommonArgs,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parse a YYYY-MM-DD date as midnight UTC.
fn parse_since(value: &str) -> DateTime<Utc> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_else(|e| {
        bail(format!("Invalid --since date \"{value}\" (expected YYYY-MM-DD): {e}"))
    });
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| bail(format!("Invalid --since date \"{value}\"")));
    Utc.from_utc_datetime(&midnight)
}

/// Load config file and build the racetime client (CLI flags win).
fn setup(common: &CommonArgs) -> (H2hConfig, RacetimeClient) {
    init_logging(common.verbose);

    let config_path = common.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let base_url = common
        .base_url
        .clone()
        .or_else(|| cfg.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    (cfg, RacetimeClient::new(Client::new(), &base_url))
}

/// Validate the slug, then load every page of it into a fresh board.
async fn load_category(
    source: &RacetimeClient,
    args: &LoadArgs,
) -> (CategoryInfo, MatchupBoard) {
    let info = source.fetch_category_info(&args.slug).await.unwrap_or_else(|e| bail(e));
    info!(category = %info.display_name, url = %info.external_url, "loading category");

    let board = RefCell::new(MatchupBoard::new());
    let mut session = board.borrow_mut().start_session(&args.slug);
    if let Some(ref since) = args.since {
        session = session.with_cutoff(parse_since(since));
    }

    let outcome = session.run(source, &board).await;
    match outcome {
        SessionOutcome::Complete { pages_loaded } => {
            info!(pages = pages_loaded, races = board.borrow().race_count(), "load complete");
        }
        SessionOutcome::Failed(e) => {
            warn!(
                error = %e,
                page = session.cursor(),
                progress = session.progress(),
                "load failed; showing the races loaded before the failure"
            );
        }
        SessionOutcome::Cancelled => bail("Load was cancelled"),
    }

    (info, board.into_inner())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Table(args) => run_table(args).await,
        Commands::Goals(args) => run_goals(args).await,
        Commands::Check(args) => {
            let (_, source) = setup(&args.common);
            if source.is_valid_category(&args.slug).await {
                println!("{} is a valid category", args.slug);
            } else {
                bail(format!("{} is not a valid category", args.slug));
            }
        }
        Commands::Init(args) => {
            let path = args.config.unwrap_or_else(config::config_path);
            config::create_default_config(&path);
            println!("Created config at {}", path.display());
            println!("Edit it to set your default base URL and goal.");
        }
    }
}

async fn run_table(args: TableArgs) {
    let (cfg, source) = setup(&args.load.common);

    let goal = args.goal.clone().or(cfg.goal).unwrap_or_else(|| {
        bail(
            "No goal specified. Pass --goal or set it in the config file \
             (see `h2h goals <slug>` for options)",
        );
    });

    let (info, mut board) = load_category(&source, &args.load).await;

    let has_races = board.goal_race_counts().iter().any(|(g, _)| *g == goal);
    if !info.available_goals.contains(&goal) && !has_races {
        bail(format!(
            "No races found for goal \"{goal}\". Run `h2h goals {}` to list goals.",
            args.load.slug
        ));
    }
    board.set_active_goal(&goal);

    if args.json {
        output::print_json(&board, &args.load.slug);
        return;
    }

    let still_loading = board.last_notice().map(|_| board.load_progress());
    println!("{}", output::summary_line(&info.display_name, board.race_count(), still_loading));
    println!("{} | {} players\n", info.external_url, board.participant_count());

    if board.participant_count() == 0 {
        println!("No recorded races for goal \"{goal}\".");
        return;
    }
    output::print_table(&board);

    if let Some(notice) = board.last_notice() {
        eprintln!("\nWarning: {notice}");
    }
}

async fn run_goals(args: LoadArgs) {
    let (_, source) = setup(&args.common);
    let (info, board) = load_category(&source, &args).await;

    println!("{}", output::summary_line(&info.display_name, board.race_count(), None));
    println!();
    output::print_goals(&board.goal_race_counts(), &info.available_goals);

    if let Some(notice) = board.last_notice() {
        eprintln!("\nWarning: {notice}");
    }
}
