//! check-dockerfile CLI

use anyhow::{bail, Context, Result};
use check_dockerfile::config::{ColorMode, Config, OutputFormat};
use check_dockerfile::engine::Engine;
use check_dockerfile::output::{JsonFormatter, OutputFormatter, TextFormatter};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Exit code for errors that stop the run before any rule is evaluated
const EXIT_FATAL: i32 = 2;

#[derive(Parser)]
#[command(
    name = "check-dockerfile",
    version,
    about = "Check a Dockerfile for issues",
    long_about = "Checks Dockerfiles against best practices: trusted base image, explicit tag, \
                  non-root user, apt-get hygiene and secrets."
)]
struct Cli {
    /// Dockerfiles to check
    #[arg(required_unless_present = "list_rules")]
    files: Vec<PathBuf>,

    /// Configuration file path (default: ./.check_dockerfile.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli
        .config
        .clone()
        .or_else(|| Config::find_in_dir(Path::new(".")));

    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            Config::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };
    config.merge_cli(cli.format.map(OutputFormat::from), cli.jobs, cli.no_color);
    Ok(config)
}

fn list_rules(engine: &Engine) {
    for rule in engine.rules() {
        println!("{:<24} {}", rule.id.cyan(), rule.title);
        println!("{:<24} {}", "", rule.description.dimmed());
    }
}

fn run(cli: &Cli) -> Result<i32> {
    // Listing rules needs no config, so a broken config file can't block it
    if cli.list_rules {
        if cli.no_color {
            colored::control::set_override(false);
        }
        list_rules(&Engine::new(Config::default().trust()));
        return Ok(0);
    }

    let config = load_config(cli)?;

    match config.output.color {
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Auto => {}
    }

    let engine = Engine::new(config.trust()).with_settings(config.engine);

    let run = engine.check_files(&cli.files)?;
    log::debug!(
        "checked {} files in {:.2}s",
        run.files_checked(),
        run.duration.as_secs_f64()
    );

    let formatter: Box<dyn OutputFormatter> = match config.output.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new();
            if config.output.color == ColorMode::Never {
                Box::new(formatter.without_color())
            } else {
                Box::new(formatter)
            }
        }
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
    };
    print!("{}", formatter.format(&run));

    Ok(run.exit_code())
}

fn main() {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            EXIT_FATAL
        }
    };
    std::process::exit(exit_code);
}
