//! neetprep CLI — timed NEET practice quizzes from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "neetprep", version, about = "Timed NEET practice quizzes with weak-topic recommendations")]
struct Cli {
    /// Config file path (default: ./neetprep.toml, then ~/.config/neetprep/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz
    Take(commands::take::TakeArgs),

    /// List the chapters of a subject
    Chapters {
        /// Subject, e.g. "physics"
        #[arg(long)]
        subject: String,
    },

    /// Show saved results
    History {
        /// Only this subject
        #[arg(long)]
        subject: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show the average score per subject
    Progress {
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Recommend weak chapters to revise
    Recommend {
        /// Flag chapters averaging below this percentage (default from config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Also save the report as JSON under the output directory
        #[arg(long)]
        save: bool,

        /// Exit code 1 if weak chapters are found
        #[arg(long)]
        fail_on_weak: bool,
    },

    /// Check a subject's question bank for broken questions
    Validate {
        /// Subject to check
        #[arg(long)]
        subject: String,

        /// Only this chapter
        #[arg(long)]
        chapter: Option<String>,
    },

    /// Create a starter config and a sample question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("neetprep=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Take(args) => commands::take::execute(args, config).await,
        Commands::Chapters { subject } => commands::chapters::execute(subject, config).await,
        Commands::History { subject, format } => {
            commands::history::execute(subject, format, config).await
        }
        Commands::Progress { format } => commands::progress::execute(format, config).await,
        Commands::Recommend {
            threshold,
            format,
            save,
            fail_on_weak,
        } => commands::recommend::execute(threshold, format, save, fail_on_weak, config).await,
        Commands::Validate { subject, chapter } => {
            commands::validate::execute(subject, chapter, config).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
