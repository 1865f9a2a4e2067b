//! AlertGate CLI
//!
//! Command-line interface for the AlertGate remote Alertmanager gateway.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use alertgate::cancel::CancellationToken;
use alertgate::models::{
    AlertQuery, GettableAlert, GettableSilence, Matcher, PostableAlert, PostableSilence,
    PostableUserConfig,
};
use alertgate::store::FileConfigStore;
use alertgate::{Config, RemoteAlertmanager};

/// AlertGate - gateway to a remote, multi-tenant Alertmanager
#[derive(Parser)]
#[command(name = "alertgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "ALERTGATE_CONFIG")]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait until the remote Alertmanager is ready
    Ready,

    /// Push or pull the alerting configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage silences
    Silences {
        #[command(subcommand)]
        command: SilencesCommands,
    },

    /// Read and send alerts
    Alerts {
        #[command(subcommand)]
        command: AlertsCommands,
    },

    /// List configured receivers
    Receivers,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Apply a configuration document (JSON) and store it locally
    Push {
        /// Path to the configuration document
        file: String,
    },

    /// Store the configuration currently applied remotely
    Pull,
}

#[derive(Subcommand)]
enum SilencesCommands {
    /// List silences
    List {
        /// Label matcher, e.g. `alertname="Watchdog"` (repeatable)
        #[arg(long)]
        filter: Vec<String>,
    },

    /// Show one silence
    Get {
        /// Silence ID
        silence_id: String,
    },

    /// Create a silence
    Create {
        /// Matcher as name=value, name!=value, name=~regex or name!~regex (repeatable)
        #[arg(long = "matcher", short = 'm', required = true)]
        matchers: Vec<String>,

        /// How long the silence lasts
        #[arg(long, default_value = "1h")]
        duration: String,

        /// Author of the silence
        #[arg(long, env = "USER", default_value = "alertgate")]
        created_by: String,

        /// Comment
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Expire a silence
    Delete {
        /// Silence ID
        silence_id: String,
    },
}

#[derive(Subcommand)]
enum AlertsCommands {
    /// List alerts
    List {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// List alert groups
    Groups {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Send alerts (JSON array) through the dispatcher
    Send {
        /// Path to the alerts file
        file: String,

        /// How long to wait for delivery before exiting
        #[arg(long, default_value = "2s")]
        wait: String,
    },
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Label matcher (repeatable)
    #[arg(long)]
    filter: Vec<String>,

    /// Only alerts routed to this receiver (regex)
    #[arg(long, default_value = "")]
    receiver: String,

    /// Exclude active alerts
    #[arg(long)]
    no_active: bool,

    /// Exclude silenced alerts
    #[arg(long)]
    no_silenced: bool,

    /// Exclude inhibited alerts
    #[arg(long)]
    no_inhibited: bool,
}

impl From<QueryArgs> for AlertQuery {
    fn from(args: QueryArgs) -> Self {
        Self {
            active: !args.no_active,
            silenced: !args.no_silenced,
            inhibited: !args.no_inhibited,
            filter: args.filter,
            receiver: args.receiver,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    match run(cli.command, config, cli.format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

async fn run(command: Commands, config: Config, format: OutputFormat) -> anyhow::Result<()> {
    let store = Arc::new(FileConfigStore::new(&config.storage.dir));
    let gateway = RemoteAlertmanager::new(config.remote.clone(), config.org_id, store.clone())
        .context("creating remote Alertmanager gateway")?;

    let ctx = CancellationToken::new();
    let on_interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let result = match command {
        Commands::Ready => run_ready(&gateway, &ctx).await,
        Commands::Config { command } => {
            run_config(&gateway, &store, config.org_id, command, &ctx, format).await
        }
        Commands::Silences { command } => run_silences(&gateway, command, &ctx, format).await,
        Commands::Alerts { command } => run_alerts(&gateway, command, &ctx, format).await,
        Commands::Receivers => run_receivers(&gateway, &ctx, format).await,
        Commands::Completions { .. } => Ok(()),
    };

    gateway.stop_and_wait().await;
    gateway.clean_up();
    result
}

async fn run_ready(gateway: &RemoteAlertmanager, ctx: &CancellationToken) -> anyhow::Result<()> {
    gateway.check_readiness(ctx).await?;
    println!("Remote Alertmanager at {} is ready", gateway.url());
    Ok(())
}

async fn run_receivers(
    gateway: &RemoteAlertmanager,
    ctx: &CancellationToken,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let receivers = gateway.get_receivers(ctx).await?;
    print_output(format, &receivers, |receivers| {
        for receiver in receivers {
            println!("{}", receiver.name);
        }
    })
}

async fn run_config(
    gateway: &RemoteAlertmanager,
    store: &FileConfigStore,
    org_id: i64,
    command: ConfigCommands,
    ctx: &CancellationToken,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Push { file } => {
            let config: PostableUserConfig = read_json(&file).await?;
            gateway.save_and_apply_config(ctx, &config).await?;
            info!(url = gateway.config_url(), "Configuration pushed");
            println!(
                "Applied configuration with {} receiver(s)",
                config.alertmanager_config.receivers.len()
            );
        }
        ConfigCommands::Pull => {
            gateway.save_and_apply_default_config(ctx).await?;
            let Some(saved) = store.load(org_id).await? else {
                bail!("configuration was not stored in {}", store.dir().display());
            };
            let config: PostableUserConfig = serde_json::from_str(&saved.alertmanager_configuration)
                .context("decoding stored configuration")?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                OutputFormat::Text => {
                    println!("Stored in {}", store.dir().display());
                    println!("Receivers: {}", config.alertmanager_config.receiver_names().join(", "));
                    let templates: Vec<&str> =
                        config.template_files.keys().map(String::as_str).collect();
                    println!("Templates: {}", templates.join(", "));
                }
            }
        }
    }
    Ok(())
}

async fn run_silences(
    gateway: &RemoteAlertmanager,
    command: SilencesCommands,
    ctx: &CancellationToken,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        SilencesCommands::List { filter } => {
            let silences = gateway.list_silences(ctx, &filter).await?;
            print_output(format, &silences, |silences| {
                for silence in silences {
                    print_silence(silence);
                }
            })?;
        }
        SilencesCommands::Get { silence_id } => {
            let silence = gateway.get_silence(ctx, &silence_id).await?;
            print_output(format, &silence, print_silence)?;
        }
        SilencesCommands::Create {
            matchers,
            duration,
            created_by,
            comment,
        } => {
            let duration = humantime::parse_duration(&duration)
                .with_context(|| format!("invalid duration '{duration}'"))?;
            let starts_at = chrono::Utc::now();
            let ends_at = starts_at + chrono::Duration::from_std(duration)?;

            let silence = PostableSilence {
                id: None,
                matchers: matchers
                    .iter()
                    .map(String::as_str)
                    .map(parse_matcher)
                    .collect::<anyhow::Result<_>>()?,
                starts_at,
                ends_at,
                created_by,
                comment,
            };

            let silence_id = gateway.create_silence(ctx, &silence).await?;
            println!("{silence_id}");
        }
        SilencesCommands::Delete { silence_id } => {
            gateway.delete_silence(ctx, &silence_id).await?;
            println!("Expired silence {silence_id}");
        }
    }
    Ok(())
}

async fn run_alerts(
    gateway: &RemoteAlertmanager,
    command: AlertsCommands,
    ctx: &CancellationToken,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        AlertsCommands::List { query } => {
            let alerts = gateway.get_alerts(ctx, &query.into()).await?;
            print_output(format, &alerts, |alerts| {
                for alert in alerts {
                    print_alert(alert);
                }
            })?;
        }
        AlertsCommands::Groups { query } => {
            let groups = gateway.get_alert_groups(ctx, &query.into()).await?;
            print_output(format, &groups, |groups| {
                for group in groups {
                    println!("{} -> {}", format_labels(&group.labels), group.receiver.name);
                    for alert in &group.alerts {
                        print!("  ");
                        print_alert(alert);
                    }
                }
            })?;
        }
        AlertsCommands::Send { file, wait } => {
            let wait = humantime::parse_duration(&wait)
                .with_context(|| format!("invalid duration '{wait}'"))?;
            let alerts: Vec<PostableAlert> = read_json(&file).await?;
            let count = alerts.len();

            gateway.check_readiness(ctx).await?;
            gateway.put_alerts(ctx, alerts.into())?;

            // Delivery is asynchronous; give the dispatcher time before stopping it.
            tokio::select! {
                _ = ctx.cancelled() => {}
                _ = tokio::time::sleep(wait) => {}
            }
            println!("Queued {count} alert(s) for delivery");
        }
    }
    Ok(())
}

fn parse_matcher(input: &str) -> anyhow::Result<Matcher> {
    // Operators longest first so `=~` wins over `=` at the same position
    const OPERATORS: [(&str, bool, bool); 4] = [
        ("!~", true, false),
        ("=~", true, true),
        ("!=", false, false),
        ("=", false, true),
    ];

    // The leftmost operator separates the name; later ones belong to the value
    let Some((at, (op, is_regex, is_equal))) = input.char_indices().find_map(|(i, _)| {
        OPERATORS
            .into_iter()
            .find(|(op, _, _)| input[i..].starts_with(op))
            .map(|found| (i, found))
    }) else {
        bail!("matcher '{input}' has no operator")
    };

    let name = input[..at].trim();
    if name.is_empty() {
        bail!("matcher '{input}' has no label name");
    }

    Ok(Matcher {
        name: name.to_string(),
        value: input[at + op.len()..].trim().trim_matches('"').to_string(),
        is_regex,
        is_equal,
    })
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let bytes = tokio::fs::read(Path::new(path))
        .await
        .with_context(|| format!("reading {path}"))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {path}"))
}

fn print_output<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

fn print_silence(silence: &GettableSilence) {
    let matchers: Vec<String> = silence
        .matchers
        .iter()
        .map(|m| {
            let op = match (m.is_regex, m.is_equal) {
                (false, true) => "=",
                (false, false) => "!=",
                (true, true) => "=~",
                (true, false) => "!~",
            };
            format!("{}{op}\"{}\"", m.name, m.value)
        })
        .collect();

    println!(
        "{}  {:?}  {}  until {}  by {}",
        silence.id,
        silence.status.state,
        matchers.join(","),
        silence.ends_at.format("%Y-%m-%d %H:%M:%S"),
        silence.created_by
    );
}

fn print_alert(alert: &GettableAlert) {
    println!(
        "{:?}  {}  since {}",
        alert.status.state,
        format_labels(&alert.labels),
        alert.starts_at.format("%Y-%m-%d %H:%M:%S")
    );
}

fn format_labels(labels: &alertgate::models::LabelSet) -> String {
    let pairs: Vec<String> = labels.iter().map(|(k, v)| format!("{k}=\"{v}\"")).collect();
    format!("{{{}}}", pairs.join(", "))
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "alertgate", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alertname=Watchdog", "alertname", "Watchdog", false, true)]
    #[case("team!=infra", "team", "infra", false, false)]
    #[case("job=~\"node.*\"", "job", "node.*", true, true)]
    #[case("env !~ dev|test", "env", "dev|test", true, false)]
    #[case("a=x!~y", "a", "x!~y", false, true)]
    #[case("path=~/a=b", "path", "/a=b", true, true)]
    #[case("expr!=a=~b", "expr", "a=~b", false, false)]
    fn test_parse_matcher(
        #[case] input: &str,
        #[case] name: &str,
        #[case] value: &str,
        #[case] is_regex: bool,
        #[case] is_equal: bool,
    ) {
        let matcher = parse_matcher(input).unwrap();
        assert_eq!(matcher.name, name);
        assert_eq!(matcher.value, value);
        assert_eq!(matcher.is_regex, is_regex);
        assert_eq!(matcher.is_equal, is_equal);
    }

    #[rstest]
    #[case("alertname")]
    #[case("=value")]
    fn test_parse_matcher_rejects(#[case] input: &str) {
        assert!(parse_matcher(input).is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from([
            "alertgate",
            "--format",
            "json",
            "silences",
            "create",
            "-m",
            "alertname=Watchdog",
            "--duration",
            "2h",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(matches!(
            cli.command,
            Commands::Silences {
                command: SilencesCommands::Create { .. }
            }
        ));
    }
}
