//! gpu-wallet: drives the marketplace wallet controller from a terminal.

use std::time::Duration;

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};

use gpu_wallet_adapters::{InjectedWallets, RuntimeTimer, WalletAdapterConfig};
use gpu_wallet_core::{EventBridge, WalletController, WalletSnapshot};

type Controller = WalletController<InjectedWallets, RuntimeTimer>;

#[derive(Debug, Parser)]
#[command(name = "gpu-wallet", version, about = "Probe an EIP-1193 wallet through its proxy")]
struct Cli {
    /// Indent snapshot JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the wallet for an account, printing each state change
    Connect,
    /// Read the authorized account and chain without prompting
    Refresh,
    /// Keep the snapshot current, printing it whenever it changes
    Watch {
        #[arg(long, default_value_t = 5_000)]
        interval_ms: u64,
        /// Stop after this many polls
        #[arg(long)]
        iterations: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = WalletAdapterConfig::from_env().wrap_err("invalid wallet configuration")?;
    let wallets = InjectedWallets::from_config(&config)?;
    let controller = WalletController::new(wallets, RuntimeTimer, config.controller_config());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to start async runtime")?;
    runtime.block_on(run(cli, controller))
}

async fn run(cli: Cli, controller: Controller) -> Result<()> {
    let pretty = cli.pretty;
    match cli.command {
        Command::Refresh => {
            let snapshot = controller.refresh().await;
            print_snapshot(&snapshot, pretty);
        }
        Command::Connect => {
            let _printer = controller.subscribe(move |s| print_snapshot(s, pretty));
            controller.refresh().await;
            let address = controller
                .connect()
                .await
                .wrap_err("wallet connection failed")?;
            tracing::info!(wallet = %address, "connected");
        }
        Command::Watch {
            interval_ms,
            iterations,
        } => {
            print_snapshot(&controller.snapshot(), pretty);
            let _printer = controller.subscribe(move |s| print_snapshot(s, pretty));
            let mut bridge = EventBridge::attach(&controller, None);
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
            let mut polls = 0u64;
            loop {
                ticker.tick().await;
                if bridge.pump(&controller).await == 0 {
                    controller.refresh().await;
                }
                polls += 1;
                if iterations.is_some_and(|limit| polls >= limit) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &WalletSnapshot, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(snapshot)
    } else {
        serde_json::to_string(snapshot)
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(error = %e, "failed to render snapshot"),
    }
}
