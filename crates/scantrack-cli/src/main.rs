//! Scantrack CLI - Receipt analytics client
//!
//! Usage:
//!   scantrack receipts list --search costco --sort amount_high
//!   scantrack report analytics --months 6
//!   scantrack dashboard
//!   scantrack export --output receipts.csv

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let store = commands::open_store(cli.store_url.as_deref());

    match cli.command {
        Commands::Receipts { action } => match action {
            None => commands::cmd_receipts_list(&store, None, None, "newest", 50).await,
            Some(ReceiptsAction::List {
                search,
                category,
                sort,
                limit,
            }) => {
                commands::cmd_receipts_list(
                    &store,
                    search.as_deref(),
                    category.as_deref(),
                    &sort,
                    limit,
                )
                .await
            }
            Some(ReceiptsAction::Show { id }) => commands::cmd_receipts_show(&store, id).await,
            Some(ReceiptsAction::Delete { id, yes }) => {
                commands::cmd_receipts_delete(&store, id, yes).await
            }
        },
        Commands::Report { report_type } => match report_type {
            ReportType::Analytics {
                months,
                recent,
                local,
                dense,
            } => commands::cmd_report_analytics(&store, months, recent, local, dense).await,
            ReportType::Categories { months } => {
                commands::cmd_report_categories(&store, months).await
            }
            ReportType::Trends { months } => commands::cmd_report_trends(&store, months).await,
        },
        Commands::Dashboard { months } => commands::cmd_dashboard(&store, months).await,
        Commands::Export { output, format } => {
            commands::cmd_export(&store, &output, &format).await
        }
        Commands::Status => {
            let url = store.base_url().to_string();
            commands::cmd_status(&store, &url).await
        }
    }
}
