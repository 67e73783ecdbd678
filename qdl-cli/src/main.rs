//! qdl: command-line front end for parsing and formatting QDL queries.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "qdl")]
#[command(about = "Query Description Language - parse, check, and format queries")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print it in canonical form
    #[command(visible_alias = "p")]
    Parse {
        /// Query text (reads stdin if not provided)
        query: Option<String>,

        /// Output format: text, json (default from config)
        #[arg(short = 'f', long = "format")]
        format: Option<String>,

        /// Ignore content after the top-level clauses (overrides config)
        #[arg(long = "allow-trailing")]
        allow_trailing: bool,
    },

    /// Read a JSON query and print it in canonical form
    #[command(visible_alias = "fmt")]
    Format {
        /// JSON file (reads stdin if not provided)
        file: Option<String>,
    },

    /// Check that a query parses; exit status 1 if it does not
    Check {
        /// Query text (reads stdin if not provided)
        query: Option<String>,

        /// Suppress all output
        #[arg(short = 'q', long = "quiet")]
        quiet: bool,
    },

    /// Show the resolved configuration
    Config {
        /// Write the default config file if none exists
        #[arg(long = "init")]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Parse { query, format, allow_trailing } => {
            commands::parse(query.as_deref(), format.as_deref(), allow_trailing)
        }
        Commands::Format { file } => commands::format(file.as_deref()),
        Commands::Check { query, quiet } => match commands::check(query.as_deref(), quiet) {
            // Quiet checks report through the exit status alone.
            Err(qdl::Error::Syntax(_)) if quiet => std::process::exit(1),
            other => other,
        },
        Commands::Config { init } => commands::config(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
