use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use tminus::config::AppConfig;
use tminus::types::push::VapidConfig;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(AppConfig, SocketAddr),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        return RunOutcome::Exit(run_init(args));
    }

    let config = match resolve_app_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };
    RunOutcome::Serve(config, cli.listen)
}

#[derive(Parser, Debug)]
#[command(
    name = "tminus",
    version,
    about = "Countdown milestone push notification server"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// Target instant in RFC 3339 format, e.g. 2026-11-19T09:00:00Z.
    #[arg(long, env = "TMINUS_TARGET")]
    target: Option<String>,
    #[arg(long, default_value = "T-Minus", env = "TMINUS_APP_NAME")]
    app_name: String,
    #[arg(long, env = "TMINUS_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[arg(long, default_value = "127.0.0.1:3000", env = "TMINUS_LISTEN")]
    listen: SocketAddr,
    #[arg(long, env = "TMINUS_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "TMINUS_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "TMINUS_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
    #[arg(long, env = "TMINUS_CRON_SECRET")]
    cron_secret: Option<String>,
    /// Minimum time between two broadcasts of one milestone, e.g. 1h.
    #[arg(long, env = "TMINUS_SUPPRESS_WINDOW")]
    suppress_window: Option<String>,
    /// Milestone matching window around each tick, e.g. 1m.
    #[arg(long, env = "TMINUS_TOLERANCE")]
    tolerance: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match tminus::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => ("mailto:you@example.com".to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("TMINUS_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("TMINUS_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("TMINUS_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace TMINUS_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

fn resolve_app_config(cli: &Cli) -> Result<AppConfig, String> {
    let target = cli.target.as_deref().ok_or("--target is required")?;
    let target = OffsetDateTime::parse(target.trim(), &Rfc3339)
        .map_err(|_| format!("invalid target '{target}'; expected RFC 3339"))?;

    let data_dir = cli.data_dir.as_ref().ok_or("--data-dir is required")?;
    std::fs::create_dir_all(data_dir)
        .map_err(|err| format!("failed to create data directory: {err}"))?;
    let data_dir = std::fs::canonicalize(data_dir)
        .map_err(|err| format!("failed to resolve data directory: {err}"))?;

    let vapid = resolve_vapid_config(cli)?;

    let cron_secret = cli
        .cron_secret
        .as_deref()
        .ok_or("--cron-secret is required")?
        .trim();
    if cron_secret.is_empty() {
        return Err("cron secret cannot be empty".to_string());
    }

    let suppress_window = match cli.suppress_window.as_deref() {
        Some(raw) => parse_duration("suppress window", raw)?,
        None => default_suppress_window(),
    };
    let tolerance = match cli.tolerance.as_deref() {
        Some(raw) => parse_duration("tolerance", raw)?,
        None => default_tolerance(),
    };

    Ok(AppConfig {
        target,
        app_name: cli.app_name.clone(),
        data_dir,
        vapid,
        cron_secret: cron_secret.to_string(),
        suppress_window,
        tolerance,
    })
}

fn resolve_vapid_config(cli: &Cli) -> Result<VapidConfig, String> {
    match (
        cli.vapid_private_key.as_deref(),
        cli.vapid_public_key.as_deref(),
        cli.vapid_subject.as_deref(),
    ) {
        (Some(private_key), Some(public_key), Some(subject)) => Ok(VapidConfig {
            private_key: private_key.trim().to_string(),
            public_key: public_key.trim().to_string(),
            subject: subject.trim().to_string(),
        }),
        _ => Err(
            "VAPID configuration is incomplete; run `tminus init` and set \
             --vapid-private-key, --vapid-public-key, and --vapid-subject"
                .to_string(),
        ),
    }
}

fn default_suppress_window() -> Duration {
    Duration::hours(1)
}

fn default_tolerance() -> Duration {
    Duration::minutes(1)
}

fn parse_duration(name: &str, raw: &str) -> Result<Duration, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(format!("{name} cannot be empty"));
    }

    let (amount, unit) = match value.chars().last() {
        Some(ch) if ch.is_ascii_alphabetic() => {
            (&value[..value.len() - 1], ch.to_ascii_lowercase())
        }
        _ => (value, 's'),
    };

    let amount: i64 = amount
        .parse()
        .map_err(|_| format!("invalid {name} '{value}'; expected <number>[s|m|h|d]"))?;

    if amount <= 0 {
        return Err(format!("{name} must be greater than 0"));
    }

    match unit {
        's' => Ok(Duration::seconds(amount)),
        'm' => Ok(Duration::minutes(amount)),
        'h' => Ok(Duration::hours(amount)),
        'd' => Ok(Duration::days(amount)),
        _ => Err(format!(
            "invalid {name} '{value}'; expected <number>[s|m|h|d]"
        )),
    }
}
