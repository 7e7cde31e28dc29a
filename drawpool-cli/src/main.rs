mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "drawpool")]
#[command(about = "Pooled-wagering draw engine with commit-reveal close")]
#[command(version)]
struct Cli {
    /// Data directory for draw state
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new draw deployment and print the secret seed
    Init {
        /// Base-currency units per credit
        ratio: u64,
        /// Credits to the prize pool per slot
        price: u64,
        /// Credits to the owner pool per slot
        fee: u64,
        /// Secret seed to seal (generated when omitted)
        #[arg(short, long)]
        seed: Option<String>,
    },
    /// Register a named participant account
    Register {
        /// Account name
        name: String,
    },
    /// Open a draw closing after the given number of minutes
    Open {
        /// Minutes until closing time
        minutes: i64,
    },
    /// Close the draw by revealing the seed
    Close {
        /// The secret seed committed at init
        seed: String,
        /// Agreed 32-byte public anchor (hex); zero anchor when omitted
        #[arg(short, long)]
        entropy: Option<String>,
    },
    /// Buy credits with base currency
    Buy {
        /// Account name
        account: String,
        /// Payment in base-currency units
        payment: u64,
    },
    /// Authorize the pool account to pull or burn credits
    Approve {
        /// Account name
        account: String,
        /// Allowance in credits
        amount: u64,
    },
    /// Place bets in the open draw
    Bet {
        /// Account name
        account: String,
        /// Number of slots to buy
        #[arg(default_value_t = 1)]
        times: u64,
    },
    /// Withdraw winnings to an account
    Prize {
        /// Account name
        account: String,
        /// Credits to withdraw
        amount: u64,
    },
    /// Withdraw accumulated fees to the owner
    OwnerPool {
        /// Credits to withdraw
        amount: u64,
    },
    /// Burn credits and get the base-currency refund
    Refund {
        /// Account name
        account: String,
        /// Credits to return
        amount: u64,
    },
    /// Preview the winning slot for a hypothetical seed
    Preview {
        /// Seed to evaluate
        seed: String,
        /// Agreed 32-byte public anchor (hex); zero anchor when omitted
        #[arg(short, long)]
        entropy: Option<String>,
    },
    /// Show draw state and account balances
    Status,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "drawpool={},drawpool_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drawpool")
    });
    std::fs::create_dir_all(&data_dir)?;

    let result = match cli.command {
        Commands::Init {
            ratio,
            price,
            fee,
            seed,
        } => commands::init(&data_dir, ratio, price, fee, seed),
        Commands::Register { name } => commands::register(&data_dir, &name),
        Commands::Open { minutes } => commands::open_draw(&data_dir, minutes),
        Commands::Close { seed, entropy } => {
            commands::close_draw(&data_dir, &seed, entropy.as_deref())
        }
        Commands::Buy { account, payment } => commands::buy_credits(&data_dir, &account, payment),
        Commands::Approve { account, amount } => commands::approve(&data_dir, &account, amount),
        Commands::Bet { account, times } => commands::place_bets(&data_dir, &account, times),
        Commands::Prize { account, amount } => {
            commands::withdraw_prize(&data_dir, &account, amount)
        }
        Commands::OwnerPool { amount } => commands::withdraw_owner_pool(&data_dir, amount),
        Commands::Refund { account, amount } => {
            commands::return_credits(&data_dir, &account, amount)
        }
        Commands::Preview { seed, entropy } => {
            commands::preview(&data_dir, &seed, entropy.as_deref())
        }
        Commands::Status => commands::status(&data_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
