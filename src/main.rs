//! Blacklist Agent CLI.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zentinel_agent_blacklist::{Backends, BlacklistAgent, Config};

#[derive(Parser, Debug)]
#[command(name = "zentinel-agent-blacklist")]
#[command(about = "Blacklist agent for Zentinel - escalate repeat offenders by address or account")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "blacklist.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

/// One line of stdin input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    SignAddress(String),
    UnsignAddress(String),
    SignAccount(String),
    UnsignAccount(String),
    Frozen(String),
    Blacklisted(String),
    LoadBlacklist,
    Log { tag: String, content: String },
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or_default();
        let rest = parts.next().map(str::trim).unwrap_or_default();

        let subject = || {
            if rest.is_empty() {
                Err(format!("'{}' needs a subject", verb))
            } else {
                Ok(rest.to_string())
            }
        };

        match verb {
            "sign-address" => subject().map(Command::SignAddress),
            "unsign-address" => subject().map(Command::UnsignAddress),
            "sign-account" => subject().map(Command::SignAccount),
            "unsign-account" => subject().map(Command::UnsignAccount),
            "frozen" => subject().map(Command::Frozen),
            "blacklisted" => subject().map(Command::Blacklisted),
            "load-blacklist" => Ok(Command::LoadBlacklist),
            "log" => {
                let mut log = rest.splitn(2, char::is_whitespace);
                let tag = log.next().unwrap_or_default();
                if tag.is_empty() {
                    return Err("'log' needs a tag".to_string());
                }
                Ok(Command::Log {
                    tag: tag.to_string(),
                    content: log.next().map(str::trim).unwrap_or_default().to_string(),
                })
            }
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

async fn execute(agent: &BlacklistAgent, command: Command) -> Result<String> {
    let output = match command {
        Command::SignAddress(address) => format!("{:?}", agent.sign_address(&address).await?),
        Command::UnsignAddress(address) => agent.unsign_address(&address).await?.to_string(),
        Command::SignAccount(account) => format!("{:?}", agent.sign_account(&account).await?),
        Command::UnsignAccount(account) => agent.unsign_account(&account).await?.to_string(),
        Command::Frozen(account) => agent.account_is_frozen(&account).await?.to_string(),
        Command::Blacklisted(address) => agent.address_is_blacklisted(&address).await?.to_string(),
        Command::LoadBlacklist => agent.load_blacklist().await?.to_string(),
        Command::Log { tag, content } => agent.write_log(&tag, &content).await?.to_string(),
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --print-config
    if args.print_config {
        println!("{}", Config::example());
        return Ok(());
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    info!(config = %args.config.display(), "Loading configuration");
    let config = Config::load(&args.config)?;

    // Handle --validate
    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    let agent = BlacklistAgent::new(&config, Backends::in_memory()).await?;
    info!("Reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "Invalid command");
                continue;
            }
        };

        match execute(&agent, command).await {
            Ok(output) => println!("{}", output),
            Err(e) => warn!(error = %e, "Command failed"),
        }
    }

    Ok(())
}
