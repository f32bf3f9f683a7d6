//! Tillbook CLI
//!
//! Stand-in for the entry-form/table GUI: each subcommand invokes exactly
//! one core ledger operation and renders its output.
//!
//! Usage:
//!   tillbook add --im alice --method wechat --amount 50.00 --details "order 42"
//!   tillbook query alice
//!   tillbook recent
//!   tillbook totals
//!   tillbook export --start 2024-01-01 --end 2024-01-31 --out january.csv
//!   tillbook delete --contact 'alice$$' --method wechat --timestamp '2024-01-02 08:00:01'

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tillbook::store::RECENT_LIMIT;
use tillbook::{amount, export, LedgerStore, PaymentMethod, Record, Submission, SubmitOutcome};

#[derive(Parser, Debug)]
#[command(name = "tillbook")]
#[command(about = "Merchant transaction ledger")]
struct Args {
    /// Path to the ledger backing file
    #[arg(long, default_value = "accounts.json")]
    file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a payment or refund
    Add {
        /// Instant-messaging handle
        #[arg(long, default_value = "")]
        im: String,

        /// Chat-app handle
        #[arg(long, default_value = "")]
        chat: String,

        /// Marketplace shop handle
        #[arg(long, default_value = "")]
        shop: String,

        /// Payment method (wechat, taobao, alipay, jd, pinduoduo, internal)
        #[arg(long)]
        method: String,

        /// Free-text payment details
        #[arg(long, default_value = "")]
        details: String,

        /// Amount; negative for refunds
        #[arg(long)]
        amount: String,

        /// Also book the negated internal offsetting record
        #[arg(long, default_value = "false")]
        offset: bool,
    },

    /// Look up all records for one contact handle
    Query {
        /// Handle to search (any channel)
        contact: String,
    },

    /// Show the most recent records
    Recent {
        #[arg(long, default_value_t = RECENT_LIMIT)]
        limit: usize,
    },

    /// Show totals grouped by payment method
    Totals,

    /// Export a date range as a CSV table
    Export {
        /// Inclusive start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Inclusive end date (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Output file
        #[arg(long, default_value = "accounts.csv")]
        out: PathBuf,
    },

    /// Delete records matching a display tuple exactly
    Delete {
        /// Contact identity as displayed (three $-joined slots)
        #[arg(long)]
        contact: String,

        /// Payment method
        #[arg(long)]
        method: String,

        /// Details text (empty matches records with no details)
        #[arg(long, default_value = "")]
        details: String,

        /// Timestamp as displayed (YYYY-MM-DD HH:MM:SS)
        #[arg(long)]
        timestamp: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut store = LedgerStore::open(&args.file)
        .with_context(|| format!("failed to open ledger at {}", args.file.display()))?;

    match args.command {
        Command::Add {
            im,
            chat,
            shop,
            method,
            details,
            amount,
            offset,
        } => {
            let outcome = store.submit(Submission {
                im,
                chat,
                shop,
                method: method.parse::<PaymentMethod>()?,
                details,
                amount: amount::parse_amount(&amount)?,
                offsetting: offset,
            })?;
            print_receipt(&outcome);
        }

        Command::Query { contact } => {
            let query = store.query_contact(&contact)?;
            if query.records.is_empty() {
                println!("No records for {:?}", contact.trim());
            } else {
                print_table(&query.records);
                println!("Total: {}", query.total);
            }
        }

        Command::Recent { limit } => {
            let rows = store.recent(limit);
            if rows.is_empty() {
                println!("Ledger is empty");
            } else {
                print_table(&rows);
            }
        }

        Command::Totals => {
            let totals = store.totals_by_method();
            if totals.is_empty() {
                println!("Ledger is empty");
            }
            for (method, total) in totals {
                println!("{:<20} {:>12}", method.as_str(), total);
            }
        }

        Command::Export { start, end, out } => {
            let rows = store.date_range(start, end);
            if rows.is_empty() {
                println!("No records between {} and {}", start, end);
            } else {
                export::write_csv(&out, &rows)?;
                println!("Exported {} records to {}", rows.len(), out.display());
            }
        }

        Command::Delete {
            contact,
            method,
            details,
            timestamp,
        } => {
            let removed =
                store.delete_matching(&contact, method.parse::<PaymentMethod>()?, &details, &timestamp)?;
            if removed == 0 {
                println!("No matching record");
            } else {
                println!("Deleted {} record(s)", removed);
            }
        }
    }

    Ok(())
}

/// Human-readable receipt for one submission, the same lines the merchant
/// pastes into a chat with the customer.
fn print_receipt(outcome: &SubmitOutcome) {
    if !outcome.contact.im.is_empty() {
        println!("IM handle: {}", outcome.contact.im);
    }
    if !outcome.contact.chat.is_empty() {
        println!("Chat handle: {}", outcome.contact.chat);
    }
    if !outcome.contact.shop.is_empty() {
        println!("Shop handle: {}", outcome.contact.shop);
    }
    let action = if outcome.amount.is_sign_negative() {
        "refunded"
    } else {
        "paid"
    };
    println!("Customer {} {} at {}", action, outcome.amount.abs(), outcome.timestamp);
    if outcome.record_ids.len() > 1 {
        println!("Offsetting internal record booked");
    }
}

fn print_table(rows: &[Record]) {
    println!(
        "{:<30} {:<20} {:<24} {:>10}  {}",
        "contacts", "method", "details", "amount", "timestamp"
    );
    for rec in rows {
        println!(
            "{:<30} {:<20} {:<24} {:>10}  {}",
            rec.contact.encode(),
            rec.method.as_str(),
            rec.details,
            rec.amount,
            rec.display_timestamp()
        );
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tillbook=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
