//! CLI interface for tgs - Telegram search from the terminal.

use std::env;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Args, CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use env_logger::fmt::WriteStyle;
use log::{LevelFilter, debug, warn};
use serde::Serialize;
use tgs_core::telegram::SessionStorage;
use tgs_core::{
    Action, AppConfig, AppPaths, CredentialError, Credentials, LogLevel, Outcome, SearchLimits,
    TelegramClient, run_guarded,
};

const APP_NAME: &str = "tgs";

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        handle_completions(shell);
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging()?;
    debug!("resolved paths: {:#?}", ctx.paths);

    let session_name = cli
        .session
        .clone()
        .unwrap_or_else(|| ctx.config.telegram.session.clone());
    let session_file = ctx.paths.session_file(&ctx.config.telegram, &session_name)?;

    let (credentials, action) = match plan(&cli, &ctx.config, &session_file) {
        Plan::Run(credentials, action) => (credentials, action),
        Plan::Usage => {
            Cli::command().print_help()?;
            println!();
            return Ok(ExitCode::SUCCESS);
        }
        Plan::BadCredentials(err) => {
            println!("ERROR: {err}");
            if let Some(hint) = err.hint() {
                println!("{hint}");
            }
            return Ok(ExitCode::FAILURE);
        }
    };
    debug!("credentials: {credentials:?}");

    let phone = cli
        .phone
        .clone()
        .or_else(|| ctx.config.telegram.phone.clone());
    let mut client = TelegramClient::new(
        credentials,
        SessionStorage::new(session_file),
        phone,
        ctx.config.runtime.timeout.map(Duration::from_secs),
    );

    let rt = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let outcome = rt.block_on(run_guarded(&mut client, &action, interrupted()));
    // An abandoned login prompt leaves a blocking stdin read behind.
    rt.shutdown_background();
    report(&outcome)
}

/// Resolves once the user presses Ctrl-C.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}

fn report(outcome: &Outcome) -> Result<ExitCode> {
    match outcome {
        Outcome::Completed(payload) => print_json(payload)?,
        Outcome::Failed(report) => print_json(report)?,
        Outcome::Interrupted => eprintln!("\n[INFO] Interrupted by user"),
    }
    Ok(ExitCode::from(exit_status(outcome)))
}

/// Process status for a finished run. Error envelopes and interrupts are
/// successful exits; only errors that escaped the action fail.
const fn exit_status(outcome: &Outcome) -> u8 {
    if outcome.is_failure() { 1 } else { 0 }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing output to JSON")?;
    println!("{text}");
    Ok(())
}

/// What the invocation does once flags and config are known.
#[derive(Debug)]
enum Plan {
    /// Credentials are missing or malformed; nothing else is looked at.
    BadCredentials(CredentialError),
    /// Credentials are fine but no action was requested.
    Usage,
    /// Connect and run the action.
    Run(Credentials, Action),
}

/// Credentials are checked first, so even a bare `tgs` without them fails.
fn plan(cli: &Cli, config: &AppConfig, session_file: &Path) -> Plan {
    let credentials = match Credentials::resolve(
        cli.api_id.as_deref(),
        cli.api_hash.as_deref(),
        &config.telegram,
    ) {
        Ok(credentials) => credentials,
        Err(err) => return Plan::BadCredentials(err),
    };
    match select_action(cli, session_file, SearchLimits::from(&config.search)) {
        Some(action) => Plan::Run(credentials, action),
        None => Plan::Usage,
    }
}

/// Pick the single action to run. `--auth` wins over `--whoami`, which wins
/// over `--search`, which wins over `--scrape-saved`.
fn select_action(cli: &Cli, session_file: &Path, limits: SearchLimits) -> Option<Action> {
    if cli.auth {
        return Some(Action::Authenticate {
            session_file: session_file.display().to_string(),
        });
    }
    if cli.whoami {
        return Some(Action::WhoAmI);
    }
    if let Some(query) = cli.search.as_ref().filter(|q| !q.is_empty()) {
        return Some(Action::Search {
            query: query.clone(),
            chat_id: cli.chat_id,
            limits,
        });
    }
    cli.scrape_saved
        .as_ref()
        .map(|date| Action::ScrapeByDate { date: date.clone() })
}

#[derive(Debug, Parser)]
#[command(
    name = "tgs",
    author,
    version,
    about = "Search Telegram chats and scrape Saved Messages as JSON"
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,

    /// Log in (or reuse the stored session) and show the account.
    #[arg(long)]
    auth: bool,

    /// Show the logged-in account.
    #[arg(long)]
    whoami: bool,

    /// Search all chats for these keywords.
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,

    /// Only search this chat.
    #[arg(long = "chat-id", value_name = "ID", allow_negative_numbers = true)]
    chat_id: Option<i64>,

    /// Collect Saved Messages from one day.
    #[arg(long = "scrape-saved", value_name = "YYYY-MM-DD")]
    scrape_saved: Option<String>,

    /// API ID from my.telegram.org.
    #[arg(long = "api-id", env = "TELEGRAM_API_ID", hide_env_values = true)]
    api_id: Option<String>,

    /// API hash from my.telegram.org.
    #[arg(long = "api-hash", env = "TELEGRAM_API_HASH", hide_env_values = true)]
    api_hash: Option<String>,

    /// Phone number for first login (skips the prompt).
    #[arg(long, env = "TELEGRAM_PHONE", hide_env_values = true)]
    phone: Option<String>,

    /// Session name; the session file is `<NAME>.session`.
    #[arg(long, value_name = "NAME")]
    session: Option<String>,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

/// Common CLI options.
#[derive(Debug, Clone, Args)]
pub struct CommonOpts {
    /// Override the config file path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Reduce output to only errors.
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub quiet: bool,
    /// Increase logging verbosity (stackable).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
    /// Enable trace logging.
    #[arg(long)]
    pub trace: bool,
    /// Disable ANSI colors in output.
    #[arg(long = "no-color", conflicts_with = "color")]
    pub no_color: bool,
    /// Control color output.
    #[arg(long, value_enum, default_value_t = ColorOption::Auto)]
    pub color: ColorOption,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorOption {
    /// Detect terminal capabilities automatically.
    Auto,
    /// Always emit ANSI color codes.
    Always,
    /// Never emit ANSI color codes.
    Never,
}

// ─── Runtime ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let paths = AppPaths::discover(common.config.as_deref())?;
        let config = AppConfig::load(&paths)?;
        let paths = paths.apply_overrides(&config)?;
        paths.ensure_directories()?;
        Ok(Self {
            common,
            paths,
            config,
        })
    }

    fn init_logging(&self) -> Result<()> {
        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
        builder.filter_level(self.effective_log_level());

        let force_color = matches!(self.common.color, ColorOption::Always)
            || env::var_os("FORCE_COLOR").is_some();
        let disable_color = self.common.no_color
            || matches!(self.common.color, ColorOption::Never)
            || env::var_os("NO_COLOR").is_some()
            || (!force_color && !io::stderr().is_terminal());

        if disable_color {
            builder.write_style(WriteStyle::Never);
        } else if force_color {
            builder.write_style(WriteStyle::Always);
        } else {
            builder.write_style(WriteStyle::Auto);
        }

        builder.try_init().or_else(|err| {
            if self.common.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
            Ok(())
        })
    }

    const fn effective_log_level(&self) -> LevelFilter {
        if self.common.trace {
            LevelFilter::Trace
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            match self.common.verbose {
                0 => level_filter(self.config.logging.level),
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }
}

const fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
}
