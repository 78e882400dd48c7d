mod console;

use std::fmt;
use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use quiz_core::model::{DEFAULT_TIME_BUDGET_SECS, Language, ResultSummary};
use quiz_core::time::format_countdown;
use services::api::DEFAULT_API_BASE_URL;
use services::sessions::{SessionCommand, SessionEvent};
use services::{
    ApiConfig, AuthService, Clock, HttpQuizApi, QuizApi, ReviewService, SessionError,
    SessionRunner, TestSessionService,
};
use storage::repository::Storage;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use console::{Input, Screen, TEST_HELP, parse_input, render_review, render_summary};

const DEFAULT_DB_URL: &str = "sqlite://ccc.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidLanguage { raw: String },
    InvalidDuration { raw: String },
    MissingCredentials,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLanguage { raw } => {
                write!(f, "invalid --lang value: {raw} (expected en or hi)")
            }
            ArgsError::InvalidDuration { raw } => write!(f, "invalid --duration value: {raw}"),
            ArgsError::MissingCredentials => write!(f, "login requires --roll and --password"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  ccc login  --roll <roll_number> --password <password> [options]");
    eprintln!("  ccc test   [options]   # default");
    eprintln!("  ccc review [options]");
    eprintln!("  ccc status [options]");
    eprintln!("  ccc logout [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --api <url>          backend base url (default {DEFAULT_API_BASE_URL})");
    eprintln!("  --db <sqlite_url>    local store (default {DEFAULT_DB_URL})");
    eprintln!("  --lang <en|hi>       question language (default en)");
    eprintln!("  --duration <secs>    countdown for a fresh attempt (default {DEFAULT_TIME_BUDGET_SECS})");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CCC_API_BASE_URL, CCC_DB_URL, CCC_LANG, CCC_TEST_DURATION_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Login,
    Logout,
    Test,
    Review,
    Status,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "login" => Some(Self::Login),
            "logout" => Some(Self::Logout),
            "test" => Some(Self::Test),
            "review" => Some(Self::Review),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

struct Args {
    api_url: String,
    db_url: String,
    language: Language,
    duration: u32,
    roll_number: Option<String>,
    password: Option<String>,
}

impl Args {
    fn from_env() -> Self {
        let env = |key: &str| {
            std::env::var(key)
                .ok()
                .filter(|value| !value.trim().is_empty())
        };
        Self {
            api_url: env("CCC_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into()),
            db_url: env("CCC_DB_URL")
                .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url),
            language: env("CCC_LANG")
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            duration: env("CCC_TEST_DURATION_SECS")
                .and_then(|value| value.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_TIME_BUDGET_SECS),
            roll_number: None,
            password: None,
        }
    }

    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => parsed.api_url = require_value(args, "--api")?,
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--lang" => {
                    let value = require_value(args, "--lang")?;
                    parsed.language = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLanguage { raw: value.clone() })?;
                }
                "--duration" => {
                    let value = require_value(args, "--duration")?;
                    parsed.duration = value
                        .trim()
                        .parse()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or_else(|| ArgsError::InvalidDuration { raw: value.clone() })?;
                }
                "--roll" => parsed.roll_number = Some(require_value(args, "--roll")?),
                "--password" => parsed.password = Some(require_value(args, "--password")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

struct Context {
    args: Args,
    storage: Storage,
    api: Arc<dyn QuizApi>,
}

impl Context {
    fn auth(&self) -> AuthService {
        AuthService::new(Arc::clone(&self.api), Arc::clone(&self.storage.credentials))
    }

    fn review(&self) -> ReviewService {
        ReviewService::new(Arc::clone(&self.api), Arc::clone(&self.storage.credentials))
    }

    fn sessions(&self) -> TestSessionService {
        TestSessionService::new(
            Clock::default_clock(),
            Arc::clone(&self.api),
            Arc::clone(&self.storage.snapshots),
            Arc::clone(&self.storage.credentials),
        )
        .with_time_budget(self.args.duration)
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Test,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Test,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let args = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite here so the library crates stay free of process setup.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let api: Arc<dyn QuizApi> = Arc::new(HttpQuizApi::new(ApiConfig::new(&args.api_url)?)?);
    let ctx = Context { args, storage, api };

    match cmd {
        Command::Login => login(&ctx).await,
        Command::Logout => {
            ctx.auth().logout().await?;
            println!("Signed out.");
            Ok(())
        }
        Command::Status => status(&ctx).await,
        Command::Review => {
            let report = ctx.review().fetch_review().await?;
            println!("{}", render_review(&report));
            Ok(())
        }
        Command::Test => take_test(&ctx).await,
    }
}

async fn login(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(roll), Some(password)) = (&ctx.args.roll_number, &ctx.args.password) else {
        return Err(ArgsError::MissingCredentials.into());
    };
    let credential = ctx.auth().login(roll, password).await?;
    match credential.greeting() {
        Some(greeting) => println!("{greeting}"),
        None => println!("Signed in."),
    }
    Ok(())
}

async fn status(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    match ctx.auth().current().await? {
        Some(credential) => println!(
            "{}",
            credential
                .greeting()
                .unwrap_or_else(|| "Signed in.".to_string())
        ),
        None => println!("Not signed in."),
    }

    let sessions = ctx.sessions();
    match sessions.restore_snapshot().await {
        None => println!("No test in progress."),
        Some(snapshot) if snapshot.submitted => {
            let summary = ResultSummary::new(
                &snapshot.result(),
                snapshot.answers.len(),
            );
            println!("{}", render_summary(&summary));
        }
        Some(snapshot) => println!(
            "Test in progress: {} answered, {} left.",
            snapshot.answers.answered_count(),
            format_countdown(snapshot.time_left)
        ),
    }
    Ok(())
}

async fn take_test(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = ctx.sessions();
    let session = match sessions.start_session().await {
        Ok(session) => session,
        Err(SessionError::Unauthenticated) => {
            eprintln!("Please log in first to attempt the test: ccc login --roll <R> --password <P>");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if session.is_running() {
        println!("{TEST_HELP}");
    }

    let (command_tx, command_rx) = mpsc::channel(32);
    let (event_tx, mut event_rx) = mpsc::channel(64);
    let runner = SessionRunner::new(sessions, ctx.args.language);
    let running = tokio::spawn(async move { runner.run(session, command_rx, event_tx).await });

    thread::spawn(move || read_commands(command_tx));

    let mut screen = Screen::default();
    while let Some(event) = event_rx.recv().await {
        match event {
            SessionEvent::Updated(view) => {
                if let Some(text) = screen.render(&view) {
                    println!("{text}");
                }
            }
            SessionEvent::TimeUp => println!("Time is up. Submitting your answers..."),
            SessionEvent::SubmitFailed(message) => {
                println!("Submission failed: {message}. Type `s` to try again.");
            }
            SessionEvent::Submitted(summary) => println!("{}", render_summary(&summary)),
            SessionEvent::Rejected(message) => println!("{message}"),
        }
    }

    let session = running.await?;
    tracing::debug!(?session, "test runner finished");
    Ok(())
}

// Blocking stdin lives on its own thread so a pending read never holds up exit.
fn read_commands(commands: mpsc::Sender<SessionCommand>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "stdin read failed");
                break;
            }
        };
        match parse_input(&line) {
            Input::Command(command) => {
                if commands.blocking_send(command).is_err() {
                    return;
                }
            }
            Input::Help => println!("{TEST_HELP}"),
            Input::Blank => {}
            Input::Unknown => println!("Unrecognized input. Type `h` for help."),
        }
    }
    let _ = commands.blocking_send(SessionCommand::Quit);
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
