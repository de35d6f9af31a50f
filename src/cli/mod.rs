use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::api;
use crate::application::AccountService;
use crate::config::Config;
use crate::domain::{AccountId, TransferRecord};
use crate::logging::init_logging;
use crate::storage::{InMemoryStore, LedgerStore, PgLedgerStore};

/// Payments - account balances and atomic transfers
#[derive(Parser)]
#[command(name = "payments")]
#[command(about = "Account balances and atomic fund transfers backed by PostgreSQL")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Keep the ledger in process memory instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },

    /// Apply the database schema
    Migrate,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Move funds between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00")
        amount: String,

        /// Source account id
        #[arg(long)]
        from: AccountId,

        /// Destination account id
        #[arg(long)]
        to: AccountId,
    },

    /// Print the transfer audit log
    Transfers {
        /// Only transfers touching this account
        #[arg(long)]
        account: Option<AccountId>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Create {
        /// Account id (non-zero)
        id: AccountId,

        /// Initial balance (e.g., "100.00")
        balance: String,
    },

    /// Show an account's balance
    Show {
        /// Account id
        id: AccountId,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::from_env().context("Failed to load configuration")?;
        init_logging(&config.log);

        match self.command {
            Commands::Serve { in_memory } => {
                let store: Arc<dyn LedgerStore> = if in_memory {
                    info!("Using in-memory ledger");
                    Arc::new(InMemoryStore::new())
                } else {
                    Arc::new(PgLedgerStore::init(&config.database).await?)
                };
                api::serve(AccountService::new(store), &config.server).await?;
            }

            Commands::Migrate => {
                PgLedgerStore::init(&config.database).await?;
                println!("Database migrated: {}", config.database.name);
            }

            Commands::Account(account_cmd) => {
                let service = connect(&config).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Transfer { amount, from, to } => {
                let service = connect(&config).await?;
                service.transfer(from, to, &amount).await?;
                println!("Transferred {} from account {} to account {}", amount.trim(), from, to);
            }

            Commands::Transfers { account } => {
                let service = connect(&config).await?;
                let records = service.list_transfers(account).await?;
                print_transfers(&records);
            }
        }

        Ok(())
    }
}

async fn connect(config: &Config) -> Result<AccountService> {
    let store = PgLedgerStore::connect(&config.database).await?;
    Ok(AccountService::new(Arc::new(store)))
}

async fn run_account_command(service: &AccountService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create { id, balance } => {
            let account = service.create_account(id, &balance).await?;
            println!("Created account {} with balance {}", account.id, account.balance);
        }
        AccountCommands::Show { id } => {
            let account = service.get_account(id).await?;
            println!("Account {}: {}", account.id, account.balance);
        }
    }
    Ok(())
}

fn print_transfers(records: &[TransferRecord]) {
    if records.is_empty() {
        println!("No transfers found.");
        return;
    }

    println!(
        "{:>8} {:<20} {:>10} {:>10} {:>14}",
        "SEQ", "RECORDED", "FROM", "TO", "AMOUNT"
    );
    println!("{}", "-".repeat(66));

    for record in records {
        println!(
            "{:>8} {:<20} {:>10} {:>10} {:>14}",
            record.sequence,
            record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            record.source,
            record.destination,
            record.amount
        );
    }
}
