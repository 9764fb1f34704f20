//! GuideStore CLI
//!
//! Command-line tools for GuideStore catalog files.
//!
//! # Commands
//!
//! - `inspect` - Display collection counts and file metadata
//! - `verify` - Check every record of a file without opening it
//! - `backup` - Create or validate a backup copy
//! - `compact` - Rewrite the file keeping only live documents
//! - `stats` - Show a user's progress statistics
//! - `export` - Write guides as a JSON export bundle

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// GuideStore command-line tools.
#[derive(Parser)]
#[command(name = "guidestore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the catalog database file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display collection counts and file metadata
    Inspect {
        /// Show index counts per collection
        #[arg(short, long)]
        indexes: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check every record of the file
    Verify {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Create or validate backups
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Rewrite the file keeping only live documents
    Compact {
        /// Dry run - show what would be reclaimed
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show progress statistics of a user
    Stats {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write guides as a JSON export bundle
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Embed image bytes from this blob directory
        #[arg(long)]
        images: Option<PathBuf>,

        /// Only guides in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum BackupAction {
    /// Copy the database file
    Create {
        /// Destination file (timestamped file in the backup directory if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a backup file is a readable catalog
    Validate {
        /// Backup file to check
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { indexes, format } => {
            let path = cli.path.ok_or("Database path required for inspect")?;
            commands::inspect::run(&path, indexes, &format)?;
        }
        Commands::Verify { format } => {
            let path = cli.path.ok_or("Database path required for verify")?;
            commands::verify::run(&path, &format)?;
        }
        Commands::Backup { action } => match action {
            BackupAction::Create { output } => {
                let path = cli.path.ok_or("Database path required for backup")?;
                commands::backup::create(&path, output.as_deref())?;
            }
            BackupAction::Validate { file } => commands::backup::validate(&file)?,
        },
        Commands::Compact { dry_run } => {
            let path = cli.path.ok_or("Database path required for compact")?;
            commands::compact::run(&path, dry_run)?;
        }
        Commands::Stats { user, format } => {
            let path = cli.path.ok_or("Database path required for stats")?;
            commands::stats::run(&path, &user, &format)?;
        }
        Commands::Export {
            output,
            images,
            category,
        } => {
            let path = cli.path.ok_or("Database path required for export")?;
            commands::export::run(
                &path,
                output.as_deref(),
                images.as_deref(),
                category.as_deref(),
            )?;
        }
        Commands::Version => {
            println!("GuideStore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("GuideStore Core v{}", guidestore_core::VERSION);
        }
    }

    Ok(())
}
