use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use lenscan::config::Config;
use lenscan::lens::Severity;
use lenscan::ScanOptions;

#[derive(Parser)]
#[command(
    name = "lenscan",
    about = "Multi-lens static security analyzer for source trees",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree for security issues
    Scan {
        /// Root of the tree to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Write the JSON report to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Minimum severity to fail (LOW, MEDIUM, HIGH, CRITICAL)
        #[arg(long)]
        fail_on: Option<String>,

        /// Worker pool size
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
    },

    /// Generate a starter .lenscan.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan {
            path,
            config,
            output,
            fail_on,
            jobs,
        } => cmd_scan(path, config, output, fail_on, jobs),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn cmd_scan(
    path: PathBuf,
    config: Option<PathBuf>,
    output_path: Option<PathBuf>,
    fail_on_str: Option<String>,
    jobs: Option<usize>,
) -> Result<i32, lenscan::error::ScanError> {
    let fail_on = fail_on_str.and_then(|s| {
        let sev = Severity::from_str_lenient(&s);
        if sev.is_none() {
            eprintln!("Warning: unknown severity '{}', using config default", s);
        }
        sev
    });

    let options = ScanOptions {
        config_path: config,
        jobs_override: jobs,
        fail_on_override: fail_on,
    };

    let outcome = lenscan::scan(&path, &options)?;
    let rendered = serde_json::to_string_pretty(&outcome.batch)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => println!("{}", rendered),
    }

    // Exit code: 0 = pass, 1 = findings at or above threshold
    Ok(if outcome.pass { 0 } else { 1 })
}

fn cmd_init(force: bool) -> Result<i32, lenscan::error::ScanError> {
    let path = PathBuf::from(".lenscan.toml");

    if path.exists() && !force {
        eprintln!(".lenscan.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .lenscan.toml");

    Ok(0)
}
