//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Scantrack - Browse and analyze scanned receipts
#[derive(Parser)]
#[command(name = "scantrack")]
#[command(about = "Receipt analytics client for the Scan&Track store service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Receipt Store Service base URL
    ///
    /// Defaults to the SCANTRACK_STORE_URL environment variable, then
    /// http://localhost:8000.
    #[arg(long, global = true)]
    pub store_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse receipts (list, show, delete)
    Receipts {
        #[command(subcommand)]
        action: Option<ReceiptsAction>,
    },

    /// Generate analytics reports
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Show dashboard summary
    Dashboard {
        /// Trailing window in months
        #[arg(short, long, default_value = "6")]
        months: u32,
    },

    /// Export receipt data to a file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format: csv or json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// Check store service connectivity
    Status,
}

#[derive(Subcommand)]
pub enum ReceiptsAction {
    /// List receipts with search, filter and sort
    List {
        /// Search term (matches merchant, filename and extracted text)
        #[arg(short, long)]
        search: Option<String>,

        /// Filter to receipts with an item in this category (exact match)
        #[arg(short, long)]
        category: Option<String>,

        /// Sort order: newest, oldest, amount_high, amount_low, merchant
        #[arg(long, default_value = "newest")]
        sort: String,

        /// Maximum rows to display
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show one receipt with its items
    Show {
        /// Receipt ID
        id: i64,
    },

    /// Delete a receipt from the store
    Delete {
        /// Receipt ID
        id: i64,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Expense analytics: totals, monthly series, category breakdown
    Analytics {
        /// Trailing window in months
        #[arg(short, long, default_value = "12")]
        months: u32,

        /// Number of recent receipts to show
        #[arg(long, default_value = "5")]
        recent: usize,

        /// Compute locally from fetched receipts instead of using the
        /// store's pre-aggregated endpoint
        #[arg(long)]
        local: bool,

        /// Show every month of the window, zero-filling months with no
        /// activity (the series is sparse by default)
        #[arg(long)]
        dense: bool,
    },

    /// Per-category item statistics with share of total
    Categories {
        /// Trailing window in months
        #[arg(short, long, default_value = "12")]
        months: u32,
    },

    /// Month-by-category spending trend matrix
    Trends {
        /// Trailing window in months
        #[arg(short, long, default_value = "12")]
        months: u32,
    },
}
