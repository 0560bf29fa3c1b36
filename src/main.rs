//! NFT mint client.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI command
//!       │
//!       ▼
//!  ┌──────────────┐  intents   ┌─────────┐      ┌────────────────────┐
//!  │ ClientHandle │───────────▶│  inbox  │─────▶│ engine (MintClient) │
//!  └──────▲───────┘            └────▲────┘      └───┬────────────┬────┘
//!         │ snapshots               │               │            │
//!         │                   ┌─────┴─────┐   ┌─────▼─────┐ ┌────▼────┐
//!         └───────────────────│ listeners │   │  session  │ │  mint   │
//!                             └─────▲─────┘   └─────┬─────┘ └────┬────┘
//!                                   │               │            │
//!                             ┌─────┴───────────────▼────────────▼────┐
//!                             │   gateway (wallet provider, contract) │
//!                             └───────────────────┬───────────────────┘
//!                                                 ▼
//!                                JSON-RPC node  /  in-process wallet
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mint_client::config::ClientConfig;
use mint_client::gateway::{InjectedProvider, WalletProvider};
use mint_client::lifecycle::startup::{resolve_config, rpc_wallet, simulated_wallet};
use mint_client::lifecycle::{signals, Shutdown};
use mint_client::observability::init_logging;
use mint_client::reconciler::{ClientHandle, MintClient, Snapshot};

#[derive(Parser)]
#[command(name = "mint-client")]
#[command(about = "Connect a wallet and mint from the collection", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use an in-process wallet instead of a JSON-RPC node.
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Adopt an authorized account and print the collection state
    Status,
    /// Ask the wallet for an account
    Connect,
    /// Connect, then mint one item and wait for the result
    Mint,
    /// Print every state change until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!(
        required_chain = %config.network.required_chain_id,
        contract = %config.contract.address,
        simulate = cli.simulate,
        "mint-client v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if cli.simulate {
        let wallet = simulated_wallet(&config);
        run(InjectedProvider::present(wallet), &config, cli.command).await
    } else {
        run(rpc_wallet(&config), &config, cli.command).await
    }
}

async fn run<W: WalletProvider>(
    provider: InjectedProvider<W>,
    config: &ClientConfig,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_ctrl_c(shutdown.clone()));

    let client = MintClient::from_config(provider, config)?;
    let (handle, engine) = client.spawn(shutdown.subscribe());

    handle.check_silently()?;
    match command {
        Commands::Status => {}
        Commands::Connect => handle.connect()?,
        Commands::Mint => {
            handle.connect()?;
            handle.mint()?;
            let mut stop = shutdown.subscribe();
            tokio::select! {
                result = handle.wait_for(|s| !s.is_busy && s.mint.is_terminal()) => {
                    result?;
                }
                _ = stop.recv() => {}
            }
        }
        Commands::Watch => watch(&handle, &shutdown).await?,
    }

    if !shutdown.is_triggered() {
        print_snapshot(&handle.sync().await?)?;
    }

    shutdown.trigger();
    engine.await?;
    Ok(())
}

async fn watch(handle: &ClientHandle, shutdown: &Shutdown) -> Result<(), Box<dyn std::error::Error>> {
    let mut snapshots = handle.subscribe();
    let mut stop = shutdown.subscribe();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_snapshot(&snapshot)?;
            }
            _ = stop.recv() => break,
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(notice) = &snapshot.notice {
        eprintln!("{}", notice);
    }
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}
