//! Load Testing Tool
//!
//! Fires concurrent deposits of 1 at a single wallet and checks that none
//! were lost.
//!
//! Run with: cargo run --bin load_test --release -- --deposits 1000 --tasks 16

use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;

use custodial_wallet::audit::{AuditSink, PgAuditSink, TracingAuditSink};
use custodial_wallet::handlers::{
    BalanceHandler, BalanceQuery, DepositCommand, DepositHandler, RegisterUserCommand,
    RegisterUserHandler,
};
use custodial_wallet::storage::{LedgerStore, MemoryStore, PgStore};
use custodial_wallet::{Config, Ledger, OperationContext};

fn arg(args: &[String], name: &str, default: u64) -> u64 {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let deposits = arg(&args, "--deposits", 1000);
    let tasks = arg(&args, "--tasks", 16).max(1);

    let config = Config::from_env()?;
    let settings = config.ledger_settings();
    let currency = settings.reporting_currency.clone();

    let (store, audit): (Arc<dyn LedgerStore>, Arc<dyn AuditSink>) = match &config.database_url {
        Some(url) => {
            println!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await?;
            (
                Arc::new(PgStore::new(pool.clone())),
                Arc::new(PgAuditSink::new(pool)),
            )
        }
        None => {
            println!("DATABASE_URL not set, using the in-memory store");
            (Arc::new(MemoryStore::new()), Arc::new(TracingAuditSink))
        }
    };

    println!(
        "Load Test - {} deposits into one {} wallet from {} tasks ({:?} mode)",
        deposits, currency, tasks, settings.concurrency
    );

    let ledger = Ledger::new(store, audit, settings);
    let context = OperationContext::new();

    let email = format!("load-{}@example.com", uuid::Uuid::new_v4());
    let user_id = RegisterUserHandler::new(ledger.clone())
        .execute(RegisterUserCommand::new(email), &context)
        .await?
        .user_id;

    let start = Instant::now();

    let workers: Vec<_> = (0..tasks)
        .map(|worker| {
            let ledger = ledger.clone();
            let currency = currency.clone();
            // Spread the remainder over the first workers
            let share = deposits / tasks + u64::from(worker < deposits % tasks);
            tokio::spawn(async move {
                let handler = DepositHandler::new(ledger);
                let context = OperationContext::new();
                let mut failed = 0u64;
                for _ in 0..share {
                    let command = DepositCommand::new(user_id, currency.clone(), Decimal::ONE);
                    if let Err(e) = handler.execute(command, &context).await {
                        eprintln!("Deposit failed: {}", e);
                        failed += 1;
                    }
                }
                failed
            })
        })
        .collect();

    let mut failed = 0u64;
    for worker in workers {
        failed += worker.await?;
    }

    let elapsed = start.elapsed();
    let succeeded = deposits - failed;
    let rate = succeeded as f64 / elapsed.as_secs_f64();

    let view = BalanceHandler::new(ledger)
        .execute(BalanceQuery::currency(user_id, currency.clone()), &context)
        .await?;
    let final_balance = view.balance_of(&currency);

    println!("\n=== Load Test Results ===");
    println!("Total deposits: {}", deposits);
    println!("Successful: {}", succeeded);
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Rate: {:.0} deposits/sec", rate);
    println!("Final balance: {}", final_balance);

    if final_balance != Decimal::from(succeeded) {
        anyhow::bail!(
            "Lost updates: expected balance {}, found {}",
            succeeded,
            final_balance
        );
    }

    Ok(())
}
