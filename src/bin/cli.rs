//! Wordfeed CLI
//!
//! Generates words into the local store, reads them back by date, and
//! pushes them to the remote store.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use wordfeed::{
    error::{AppError, Result},
    models::{Config, Entry, PipelineConfig},
    pipeline::{self, DateOutcome, GenerationMode, GenerationPipeline, RunReport, RunRequest},
    services::{
        Approver, ConsoleApprover, ConsolePrompt, Generator, OpenAiGenerator, OpenAiVerifier,
        TrustOperator, Verifier, WordLookup,
    },
    storage::{LocalStorage, MemoryStorage, RemoteCommitter, WordStorage},
    utils::date,
};

/// Wordfeed - one word a day
#[derive(Parser, Debug)]
#[command(name = "wordfeed", version, about = "Daily vocabulary feed")]
struct Cli {
    /// Directory holding config.toml and the word store
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add words for the next unused dates
    Add {
        /// Generate with the AI generator instead of typing words
        #[arg(long)]
        ai: bool,

        /// Number of dates to fill
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        days: u32,

        /// Review every verified word before it is committed
        #[arg(long)]
        validate: bool,

        /// Generate all words in one call (requires --ai)
        #[arg(long, requires = "ai")]
        batch: bool,

        /// Push the committed words to the remote store afterwards
        #[arg(long)]
        push: bool,

        /// Run against an in-memory copy of the store
        #[arg(long, conflicts_with = "push")]
        dry_run: bool,
    },

    /// Show today's word
    Today,

    /// Show the word for a date
    Show {
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,
    },

    /// List the most recent words
    Recent {
        #[arg(short, long, default_value_t = 7)]
        count: usize,
    },

    /// Show the dates before and after a date
    Neighbors {
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,
    },

    /// Push local words to the remote store
    Push {
        /// Only push words dated on or after this date
        #[arg(long, value_parser = parse_date_arg)]
        since: Option<NaiveDate>,
    },

    /// Validate configuration and the word store
    Validate,

    /// Show store statistics
    Info,
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    date::parse_date(s).map_err(|e| e.to_string())
}

/// Initialize logging: flags win over RUST_LOG, which wins over config.
fn init_logging(cli: &Cli, configured: &str) {
    let env = env_logger::Env::default().default_filter_or(configured);
    let mut builder = env_logger::Builder::from_env(env);
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder.format_timestamp_secs().init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.data_dir.join("config.toml");
    let loaded = Config::load_if_exists(&config_path);
    let level = match &loaded {
        Ok(Some(config)) => config.logging.level.clone(),
        _ => "info".to_string(),
    };
    init_logging(&cli, &level);

    let mut config = match loaded {
        Ok(Some(config)) => {
            log::debug!("Loaded configuration from {}", config_path.display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            log::warn!(
                "Config load failed from {}: {}. Using defaults.",
                config_path.display(),
                e
            );
            Config::default()
        }
    };

    // Variables already in the process environment take precedence.
    match dotenvy::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Ignoring .env: {}", e),
    }
    config.apply_env(std::env::vars());

    let storage = LocalStorage::new(config.store_path(&cli.data_dir));
    let today = date::today();

    match cli.command {
        Command::Add {
            ai,
            days,
            validate,
            batch,
            push,
            dry_run,
        } => {
            config.validate()?;
            let memory;
            let target: &dyn WordStorage = if dry_run {
                memory = MemoryStorage::new(storage.load().await?);
                log::info!("Dry run: nothing will be written to {}", storage.location());
                &memory
            } else {
                &storage
            };

            let report = if ai {
                let generator = OpenAiGenerator::new(&config.generator)?;
                let verifier = OpenAiVerifier::new(&config.generator)?;
                let approver = validate.then(ConsoleApprover::stdio);
                let mode = if batch {
                    GenerationMode::Batch
                } else {
                    GenerationMode::Single
                };
                run_pipeline(
                    config.pipeline.clone(),
                    target,
                    &generator,
                    &verifier,
                    approver.as_ref().map(|a| a as &dyn Approver),
                    RunRequest {
                        days: days as usize,
                        mode,
                        today,
                    },
                )
                .await?
            } else {
                if validate {
                    log::warn!("--validate has no effect on manually entered words");
                }
                println!("Enter each word; leave the word empty to skip a date.");
                let policy = PipelineConfig {
                    max_retries: 1,
                    max_duplicates: 1,
                    ..config.pipeline.clone()
                };
                run_pipeline(
                    policy,
                    target,
                    &ConsolePrompt::stdio(),
                    &TrustOperator,
                    None,
                    RunRequest {
                        days: days as usize,
                        mode: GenerationMode::Single,
                        today,
                    },
                )
                .await?
            };

            print_report(&report);

            if push {
                let committed: Vec<Entry> = report.committed().into_iter().cloned().collect();
                push_entries(&config, &committed).await?;
            }
        }

        Command::Today => {
            let records = storage.load().await?;
            match WordLookup::new(&records, today).today_word() {
                Some(entry) => print_entry(entry),
                None => println!("No word for today ({}).", date::format_date(today)),
            }
        }

        Command::Show { date: day } => {
            let records = storage.load().await?;
            let lookup = WordLookup::new(&records, today);
            match lookup.word_for_date(day) {
                Some(entry) => print_entry(entry),
                None if lookup.is_future(day) => {
                    println!("{} is in the future.", date::format_date(day))
                }
                None => println!("No word for {}.", date::format_date(day)),
            }
        }

        Command::Recent { count } => {
            let records = storage.load().await?;
            let recent = WordLookup::new(&records, today).recent_words(count);
            if recent.is_empty() {
                println!("No words yet.");
            }
            for entry in recent {
                println!("{}  {}", entry.date_str(), entry.word);
            }
        }

        Command::Neighbors { date: day } => {
            let records = storage.load().await?;
            let lookup = WordLookup::new(&records, today);
            let show = |d: Option<NaiveDate>| d.map_or_else(|| "-".to_string(), date::format_date);
            println!("previous: {}", show(lookup.previous_date(day)));
            println!("next:     {}", show(lookup.next_date(day)));
        }

        Command::Push { since } => {
            config.validate()?;
            let records = storage.load().await?;
            let entries = pipeline::entries_since(&records, since);
            push_entries(&config, &entries).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            Config::load_if_exists(&config_path)?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let records = storage.load().await?;
            log::info!("✓ Store OK: {} entries in {}", records.len(), storage.location());

            if config.generator.api_key.is_none() {
                log::warn!("OPENAI_API_KEY is not set; only manual entry is available");
            }
            if config.remote.require_credentials().is_err() {
                log::warn!("GITHUB_TOKEN or GITHUB_REPO is not set; push is unavailable");
            }
        }

        Command::Info => {
            let records = storage.load().await?;
            let fmt = |d: Option<NaiveDate>| d.map_or_else(|| "-".to_string(), date::format_date);
            println!("Store:      {}", storage.location());
            println!("Entries:    {}", records.len());
            println!("First date: {}", fmt(records.first_date()));
            println!("Last date:  {}", fmt(records.last_date()));
            println!(
                "Next date:  {}",
                date::format_date(date::next_unused_date(records.entries(), today))
            );
        }
    }

    Ok(())
}

async fn run_pipeline(
    policy: PipelineConfig,
    storage: &dyn WordStorage,
    generator: &dyn Generator,
    verifier: &dyn Verifier,
    approver: Option<&dyn Approver>,
    request: RunRequest,
) -> Result<RunReport> {
    let mut pipeline = GenerationPipeline::new(policy, storage, generator, verifier);
    if let Some(approver) = approver {
        pipeline = pipeline.with_approver(approver);
    }
    pipeline.run(request).await
}

async fn push_entries(config: &Config, entries: &[Entry]) -> Result<()> {
    let secret = config
        .remote
        .secret
        .as_deref()
        .ok_or_else(|| AppError::config("GENERATE_SECRET is not configured"))?;
    let committer = RemoteCommitter::from_config(&config.remote, config.generator.timeout_secs)?;

    let summary = pipeline::publish(&committer, secret, entries).await?;
    match summary.commit_message {
        Some(message) => println!("Pushed: {message}"),
        None => println!("Remote is up to date."),
    }
    Ok(())
}

fn print_entry(entry: &Entry) {
    println!("{}  {}", entry.date_str(), entry.word);
    println!("  {}", entry.explanation);
    println!("  \"{}\"", entry.example);
}

fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        match outcome {
            DateOutcome::Committed(entry) => println!("✓ {}  {}", entry.date_str(), entry.word),
            DateOutcome::Skipped { date: day, reason } => {
                println!("- {}  skipped ({})", date::format_date(*day), reason)
            }
            DateOutcome::Exhausted { date: day, attempts } => println!(
                "✗ {}  no word after {} attempt(s)",
                date::format_date(*day),
                attempts
            ),
        }
    }
    log::info!(
        "{} generator call(s), {} verifier call(s), {} duplicate(s), {} invalid, {} adapter failure(s)",
        report.generator_calls,
        report.verifier_calls,
        report.duplicates,
        report.invalid,
        report.adapter_failures
    );
}
