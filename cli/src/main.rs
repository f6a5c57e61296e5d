mod commands;
mod config;
mod server;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    FoodArgs, GoalArgs, cmd_food_add, cmd_food_list, cmd_goals_set, cmd_goals_show, cmd_history,
    cmd_summary,
};
use crate::config::Config;
use macrolog_core::Tracker;

const DEFAULT_LOG_FILTER: &str = "macrolog=info,macrolog_core=info,tower_http=info";

#[derive(Parser)]
#[command(
    name = "macrolog",
    version,
    about = "Nutrition tracking server and CLI",
    long_about = "Track foods, meal entries and daily macro goals.\n\n\
                  Run `macrolog serve` for the REST API, or use the other commands \
                  to inspect the same data directory locally."
)]
struct Cli {
    /// Directory holding users.json, foods.json and entries.json
    #[arg(long, env = "MACROLOG_DATA_DIR", global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
    /// Manage the global food catalogue
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Show a user's daily summary (defaults to today)
    Summary {
        /// Email of the user
        #[arg(long)]
        email: String,
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a user's seven-day history ending at a date
    History {
        /// Email of the user
        #[arg(long)]
        email: String,
        /// Last day of the week (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        start: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change a user's daily goals
    Goals {
        #[command(subcommand)]
        command: GoalCommands,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a global food visible to every user
    Add {
        /// Food name
        name: String,
        /// Calories per serving
        #[arg(long)]
        calories: f64,
        /// Protein per serving (g)
        #[arg(long)]
        protein: Option<f64>,
        /// Carbs per serving (g)
        #[arg(long)]
        carbs: Option<f64>,
        /// Fats per serving (g)
        #[arg(long)]
        fats: Option<f64>,
        /// Serving size
        #[arg(long)]
        serving_size: Option<f64>,
        /// Serving unit (e.g. g, ml, piece)
        #[arg(long)]
        serving_unit: Option<String>,
        /// Category (e.g. fruit, dairy)
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List global foods
    List {
        /// Filter by name substring
        #[arg(short, long)]
        search: Option<String>,
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Show the user's goals
    Show {
        /// Email of the user
        #[arg(long)]
        email: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one or more of the user's goals
    Set {
        /// Email of the user
        #[arg(long)]
        email: String,
        /// Daily calorie goal
        #[arg(long)]
        calories: Option<f64>,
        /// Daily protein goal (g)
        #[arg(long)]
        protein: Option<f64>,
        /// Daily carbs goal (g)
        #[arg(long)]
        carbs: Option<f64>,
        /// Daily fats goal (g)
        #[arg(long)]
        fats: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir)?;
    let tracker = Tracker::open(&config.data_dir)?;

    match cli.command {
        Commands::Serve { port, bind } => server::start_server(tracker, port, &bind).await,
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                calories,
                protein,
                carbs,
                fats,
                serving_size,
                serving_unit,
                category,
                json,
            } => cmd_food_add(
                &tracker,
                FoodArgs {
                    name,
                    calories,
                    protein,
                    carbs,
                    fats,
                    serving_size,
                    serving_unit,
                    category,
                },
                json,
            ),
            FoodCommands::List {
                search,
                category,
                json,
            } => cmd_food_list(&tracker, search, category, json),
        },
        Commands::Summary { email, date, json } => cmd_summary(&tracker, &email, date, json),
        Commands::History { email, start, json } => cmd_history(&tracker, &email, start, json),
        Commands::Goals { command } => match command {
            GoalCommands::Show { email, json } => cmd_goals_show(&tracker, &email, json),
            GoalCommands::Set {
                email,
                calories,
                protein,
                carbs,
                fats,
                json,
            } => cmd_goals_set(
                &tracker,
                &email,
                GoalArgs {
                    calories,
                    protein,
                    carbs,
                    fats,
                },
                json,
            ),
        },
    }
}
