//! CLI entry point for `mailsort`.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn, Level};

use mailsort::classifier::Classifier;
use mailsort::config::{self, Config};
use mailsort::export::attachment::AttachmentExtractor;
use mailsort::export::csv::AuditLog;
use mailsort::logging;
use mailsort::mailbox::ImapTransport;
use mailsort::poll::PollCycle;
use mailsort::scheduler::{self, Scheduler};

#[derive(Parser)]
#[command(
    name = "mailsort",
    version,
    about = "Poll an IMAP mailbox, sort unread mail by subject and save attachments"
)]
struct Cli {
    /// Configuration file (default: $MAILSORT_CONFIG, ./mailsort.toml, then the user config dir)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Check the mailbox once and exit instead of running on a schedule
    #[arg(long)]
    once: bool,

    /// Validate the configuration, print the category table and exit
    #[arg(long)]
    check_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            logging::note(Level::ERROR, &format!("Critical error, stopping: {message}"));
            eprintln!("mailsort: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = config::load_config(cli.config.as_deref()).context("loading configuration")?;

    if cli.check_config {
        print_config_summary(&config);
        return Ok(ExitCode::SUCCESS);
    }

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let to_stderr = cli.once || std::io::stderr().is_terminal();
    logging::init(
        &config.storage.log_dir,
        &config.storage.diagnostic_file,
        log_level,
        to_stderr,
    )?;

    if config.mailbox.password.is_empty() {
        warn!(
            "mailbox.password is empty; set it in the config file or via {}",
            config::PASSWORD_ENV
        );
    }

    let cycle = build_cycle(&config)?;

    if cli.once {
        let outcome = cycle.run_cycle();
        scheduler::log_outcome(&outcome);
        return Ok(if outcome.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    info!(
        interval_minutes = config.schedule.interval_minutes,
        host = %config.mailbox.host,
        folder = %config.mailbox.folder,
        "Mail sorter started"
    );
    let mut scheduler = Scheduler::new(
        config.interval(),
        config.tick(),
        config.schedule.run_at_startup,
    );
    let fatal = scheduler.run_forever(|| cycle.run_cycle());
    logging::note(Level::ERROR, &format!("Critical error, stopping: {}", fatal.chain()));
    Ok(ExitCode::FAILURE)
}

/// Wire the configured pieces into a poll cycle over IMAP.
fn build_cycle(config: &Config) -> anyhow::Result<PollCycle<ImapTransport>> {
    let audit = AuditLog::open(config.csv_path())?;
    Ok(PollCycle::new(
        ImapTransport,
        config.mailbox.clone(),
        config.classification.no_subject.clone(),
        Classifier::new(config.category_table()),
        AttachmentExtractor::new(&config.storage.attachments_dir),
        audit,
    ))
}

/// Print what the daemon would run with.
fn print_config_summary(config: &Config) {
    println!();
    println!(
        "  {:<20} {}:{} (tls: {})",
        "Server", config.mailbox.host, config.mailbox.port, config.mailbox.tls
    );
    println!("  {:<20} {}", "Account", config.mailbox.address);
    println!(
        "  {:<20} {} / {}",
        "Folder / search", config.mailbox.folder, config.mailbox.search
    );
    println!(
        "  {:<20} every {} min",
        "Schedule", config.schedule.interval_minutes
    );
    println!(
        "  {:<20} {}",
        "Attachments",
        config.storage.attachments_dir.display()
    );
    println!("  {:<20} {}", "Audit log", config.csv_path().display());
    println!();
    println!("  Categories (first match wins):");
    for rule in &config.classification.categories {
        println!("    {:<16} {}", rule.name, rule.keywords.join(", "));
    }
    println!("    {:<16} (fallback)", config.classification.fallback);
    println!();
}
