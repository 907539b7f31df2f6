/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Prices, order-book snapshots or placed orders as JSON on stdout
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hyphe_adapter::{HypheClient, HypheWebSocket, Side};
use hyphe_cli::{CliConfig, OrderRequest, commands};

#[derive(Parser, Debug)]
#[command(name = "hyphe-cli", version, about = "Hyphe trading venue client")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "api-key", env = "HYPHE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Use the sandbox deployment
    #[arg(long)]
    sandbox: bool,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "dry-run")]
    dry_run: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Indicative prices for every crypto asset
    Prices,
    /// One order-book snapshot from the streaming socket
    Book {
        #[arg(long)]
        base: String,
        #[arg(long)]
        quote: String,
    },
    /// Place a market order, or a quote order with --quote-id
    Order {
        #[arg(long)]
        asset: String,
        #[arg(long, value_enum)]
        side: SideArg,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long = "fiat-amount")]
        fiat_amount: Option<Decimal>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long = "quote-id")]
        quote_id: Option<String>,
        #[arg(long = "ref-id")]
        ref_id: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SideArg {
    Buy,
    Sell,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Buy => Side::Buy,
            SideArg::Sell => Side::Sell,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let mut config = load_config(args.config_path.as_ref())?;
    config.apply_overrides(args.api_key.clone(), args.sandbox);
    info!(
        environment = ?config.environment,
        has_api_key = config.api_key.is_some(),
        dry_run = args.dry_run,
        "configuration loaded"
    );

    let client = HypheClient::with_config(config.client_config(), config.api_key.clone())
        .context("build rest client")?;
    let ws = HypheWebSocket::with_config(config.ws_config(), config.api_key.clone())
        .context("build websocket client")?;

    let output = match args.command {
        Command::Prices => {
            if args.dry_run {
                info!(url = %client.base_url(), "dry-run requested; prices not fetched");
                return Ok(());
            }
            commands::prices(&client).await?
        }
        Command::Book { base, quote } => {
            if args.dry_run {
                info!(url = %ws.url(), base = %base, quote = %quote, "dry-run requested; book not fetched");
                return Ok(());
            }
            let shutdown = CancellationToken::new();
            setup_signal_handlers(shutdown.clone());
            commands::book_snapshot(&ws, &base, &quote, &shutdown).await?
        }
        Command::Order {
            asset,
            side,
            currency,
            amount,
            fiat_amount,
            price,
            quote_id,
            ref_id,
        } => {
            let request = OrderRequest {
                asset,
                side: side.into(),
                currency,
                amount,
                fiat_amount,
                price,
                quote_id,
                ref_id,
            };
            commands::place_order(&client, &request, args.dry_run).await?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let path_str = path.to_str().context("config path must be valid utf-8")?;
    CliConfig::from_file(path_str).context("load config")
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
