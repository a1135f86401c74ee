mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_bmi, cmd_dashboard, cmd_protein, cmd_user_add, cmd_user_list, cmd_user_rotate_token,
};
use crate::config::Config;
use mealwise_core::db::Database;

#[derive(Parser)]
#[command(
    name = "mealwise",
    version,
    about = "Meal planner and nutrition tracker",
    long_about = "Plan meals, track water, exercise and weight, and serve it all over a REST API."
)]
struct Cli {
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
        /// Disable token authentication; every request acts as the local user
        #[arg(long)]
        no_auth: bool,
    },
    /// Manage users and their API tokens
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Show the calorie, water and exercise dashboard for a user
    Dashboard {
        /// Email of the user
        #[arg(short, long)]
        user: String,
        /// Period: this-week, last-week, this-month, last-month
        #[arg(short, long, default_value = "this-week")]
        period: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Health calculators
    Health {
        #[command(subcommand)]
        command: HealthCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user and print its API token
    Add {
        /// Email address
        email: String,
        /// Full name
        full_name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List users
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace a user's API token with a new one
    RotateToken {
        /// Email address
        email: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum HealthCommands {
    /// Body mass index, plus BMR and a calorie goal when age and gender are given
    Bmi {
        /// Height in centimetres
        #[arg(long)]
        height: f64,
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
        /// Age in years
        #[arg(long)]
        age: Option<i64>,
        /// Gender: male, female
        #[arg(long)]
        gender: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recommended daily protein in grams
    Protein {
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
        /// Grams of protein per pound of body weight
        #[arg(long, default_value = "0.8")]
        factor: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
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

fn open_db() -> Result<Database> {
    let config = Config::load()?;
    Database::open(&config.db_path)
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let db = open_db()?;
            let auth = if no_auth {
                let local = db.get_or_create_local_user()?;
                server::AuthMode::Disabled { user_id: local.id }
            } else {
                server::AuthMode::Token
            };
            server::start_server(db, port, &bind, auth).await
        }
        Commands::User { command } => {
            let db = open_db()?;
            match command {
                UserCommands::Add {
                    email,
                    full_name,
                    json,
                } => cmd_user_add(&db, &email, &full_name, json),
                UserCommands::List { json } => cmd_user_list(&db, json),
                UserCommands::RotateToken { email, json } => {
                    cmd_user_rotate_token(&db, &email, json)
                }
            }
        }
        Commands::Dashboard { user, period, json } => {
            cmd_dashboard(&open_db()?, &user, &period, json)
        }
        // Calculators need no database.
        Commands::Health { command } => match command {
            HealthCommands::Bmi {
                height,
                weight,
                age,
                gender,
                json,
            } => cmd_bmi(height, weight, age, gender.as_deref(), json),
            HealthCommands::Protein {
                weight,
                factor,
                json,
            } => cmd_protein(weight, factor, json),
        },
    }
}
