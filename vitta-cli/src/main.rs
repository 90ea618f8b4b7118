use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vitta_core::SpendCategory;

mod cards_cmd;
mod config;
mod reminders_cmd;
mod session;
mod state;
mod store;

use cards_cmd::CardsCommand;
use reminders_cmd::RemindersCommand;
use session::Session;

#[derive(Parser, Debug)]
#[command(
    name = "vitta",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("VITTA_BUILD_SHA"), ")"),
    about = "Card statement cycles, payment reminders and reward picks"
)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage saved cards
    Cards {
        #[command(subcommand)]
        command: CardsCommand,
    },

    /// Work out the statement cycle and grace period from two observed dates
    Cycle {
        /// Statement close date (YYYY-MM-DD)
        #[arg(long)]
        close: Option<String>,

        /// Payment due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// Which card earns the most for a purchase category
    BestCard {
        #[arg(long)]
        category: Option<SpendCategory>,

        /// Show the winner for every category
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Utilization and interest tips for every card
    Analyze,

    /// Split a payment budget across cards, highest APR first
    Optimize {
        #[arg(long)]
        budget: f64,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Payment reminders
    Reminders {
        #[command(subcommand)]
        command: RemindersCommand,
    },

    /// Read or create ~/.vitta/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "vitta=debug,vitta_core=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn open_session() -> Result<Session> {
    let session = Session::open()?;
    tracing::debug!(home = %session.home.display(), tz = %session.tz, "session opened");
    Ok(session)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Cycle { close, due } => cards_cmd::cycle(close, due)?,
        Command::Config { command } => {
            let home = state::ensure_vitta_home()?;
            match command {
                ConfigCommand::Init => config::init_config(&home)?,
                ConfigCommand::Show => {
                    let cfg = config::load_config(&home)?;
                    println!("# {}", config::config_path(&home).display());
                    print!("{}", toml::to_string_pretty(&cfg)?);
                }
            }
        }
        Command::Cards { command } => cards_cmd::run(&open_session()?, command)?,
        Command::BestCard { category, all } => {
            cards_cmd::best_card(&open_session()?, category, all)?
        }
        Command::Analyze => cards_cmd::analyze(&open_session()?)?,
        Command::Optimize { budget, json } => {
            cards_cmd::optimize_payments(&open_session()?, budget, json)?
        }
        Command::Reminders { command } => reminders_cmd::run(&open_session()?, command).await?,
    }

    Ok(())
}
