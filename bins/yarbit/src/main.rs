//! yarbit — peer-to-peer account-balance ledger node and CLI.
//!
//! `run` launches the full node (HTTP server, mining supervisor, peer sync);
//! `balances list` and `tx add` operate directly on the on-disk ledger
//! without a running node, the way the original ledger's CLI does.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use yarbit_core::constants::DIFFICULTY;
use yarbit_core::error::NodeError;
use yarbit_core::state::State;
use yarbit_core::types::{Block, Tx};
use yarbit_miner::pow;
use yarbit_network::PeerNode;
use yarbit_node::{Node, NodeConfig};

const MAJOR_VERSION: &str = "0";
const MINOR_VERSION: &str = "4";
const FIX_VERSION: &str = "0";
const VERSION_DESCRIPTION: &str = "The Yarbit Ledger - Node Status";

#[derive(Parser)]
#[command(name = "yarbit", version, about = "A peer-to-peer account-balance ledger node")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the node and its HTTP API.
    Run(RunArgs),
    /// Interact with balances (list...).
    Balances {
        #[command(subcommand)]
        action: BalancesAction,
    },
    /// Interact with transactions (add...).
    Tx {
        #[command(subcommand)]
        action: TxAction,
    },
    /// Print the version of the yarbit CLI.
    Version,
}

#[derive(Subcommand)]
enum BalancesAction {
    /// List all balances at the current tip.
    List(DataDirArgs),
}

#[derive(Subcommand)]
enum TxAction {
    /// Add a transaction to the ledger.
    Add(TxAddArgs),
}

#[derive(Args)]
struct DataDirArgs {
    /// Path to the database directory.
    #[arg(long)]
    datadir: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    /// Path to the database directory.
    #[arg(long)]
    datadir: PathBuf,
    /// IP address the HTTP server binds to and advertises to peers.
    #[arg(long, default_value = "127.0.0.1")]
    ip: String,
    /// Port the HTTP server binds to and advertises to peers.
    #[arg(long, default_value_t = yarbit_core::constants::DEFAULT_HTTP_PORT as u64)]
    port: u64,
    /// Bootstrap peer to introduce ourselves to on startup, as `ip:port`.
    #[arg(long)]
    bootstrap: Option<String>,
    /// Account credited with the block reward for blocks this node mines.
    #[arg(long, default_value = "anonymous")]
    miner_account: String,
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Args)]
struct TxAddArgs {
    /// Path to the database directory.
    #[arg(long)]
    datadir: PathBuf,
    /// From what account to send tokens.
    #[arg(long)]
    from: String,
    /// To what account to send tokens.
    #[arg(long)]
    to: String,
    /// The amount of tokens to send.
    #[arg(long)]
    value: u64,
    /// Data to send with the transaction. `reward` is currently used.
    #[arg(long, default_value = "")]
    data: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), NodeError> {
    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Balances { action: BalancesAction::List(args) } => balances_list(args),
        Commands::Tx { action: TxAction::Add(args) } => tx_add(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

async fn run_node(args: RunArgs) -> Result<(), NodeError> {
    init_logging(&args.log_level);

    let bootstrap = args
        .bootstrap
        .as_deref()
        .map(parse_bootstrap)
        .transpose()?;

    let config = NodeConfig {
        data_dir: args.datadir,
        ip: args.ip,
        port: args.port as u16,
        bootstrap,
        miner_account: args.miner_account,
    };

    info!(socket = %config.self_socket(), datadir = %config.data_dir.display(), "starting yarbit node");

    let node = Node::new(config)?;
    let handle = node.handle();
    let shutdown = CancellationToken::new();

    let node_task = tokio::spawn(node.run(shutdown.child_token()));
    let http_task = tokio::spawn(yarbit_node::http::serve(handle, shutdown.child_token()));

    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    info!("received shutdown signal");
    shutdown.cancel();

    let _ = node_task.await;
    match http_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "http server exited with error"),
        Err(e) => error!(error = %e, "http server task panicked"),
    }

    info!("yarbit node shut down");
    Ok(())
}

fn balances_list(args: DataDirArgs) -> Result<(), NodeError> {
    let state = State::load(&args.datadir)?;
    println!("Account balances at {}\n------------------\n", state.last_hash());
    for (account, balance) in state.balances() {
        println!("{account:>10}: {balance:>10}");
    }
    Ok(())
}

/// Submits `tx` by synchronously mining a one-transaction block on top of
/// the current tip and appending it to the log — there is no running
/// supervisor to hand the transaction to in a one-shot CLI invocation.
fn tx_add(args: TxAddArgs) -> Result<(), NodeError> {
    let mut state = State::load(&args.datadir)?;

    let mut tx = Tx::new(args.from, args.to, args.value);
    tx.data = args.data;

    let candidate = Block::new(
        state.last_hash(),
        state.next_block_number(),
        now_unix(),
        "anonymous".to_string(),
        vec![tx],
    );

    let cancel = tokio_util::sync::CancellationToken::new();
    let mined = pow::search(candidate, DIFFICULTY, &cancel)
        .expect("a one-tx candidate block is never empty, so search always returns");

    state.add_block(mined)?;
    println!("TX successfully persisted to the ledger.");
    Ok(())
}

fn print_version() {
    println!("Version: {MAJOR_VERSION}.{MINOR_VERSION}.{FIX_VERSION} - {VERSION_DESCRIPTION}");
}

fn parse_bootstrap(s: &str) -> Result<PeerNode, NodeError> {
    let (ip, port) = s.rsplit_once(':').ok_or_else(|| {
        NodeError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("bootstrap peer must be ip:port, got {s}"),
        ))
    })?;
    let port: u16 = port.parse().map_err(|_| {
        NodeError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("bootstrap peer port is not a valid number: {port}"),
        ))
    })?;
    let mut peer = PeerNode::new(ip, port);
    peer.is_bootstrap = true;
    Ok(peer)
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is after the unix epoch")
        .as_secs()
}

fn init_logging(level: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_level(true))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bootstrap_splits_ip_and_port() {
        let peer = parse_bootstrap("10.0.0.1:9000").unwrap();
        assert_eq!(peer.ip, "10.0.0.1");
        assert_eq!(peer.port, 9000);
        assert!(peer.is_bootstrap);
    }

    #[test]
    fn parse_bootstrap_rejects_missing_port() {
        assert!(parse_bootstrap("10.0.0.1").is_err());
    }

    #[test]
    fn parse_bootstrap_rejects_non_numeric_port() {
        assert!(parse_bootstrap("10.0.0.1:abc").is_err());
    }

    #[test]
    fn tx_add_mines_and_persists_a_block() {
        let dir = tempfile::tempdir().unwrap();
        let args = TxAddArgs {
            datadir: dir.path().to_path_buf(),
            from: "andrej".to_string(),
            to: "babayaga".to_string(),
            value: 5,
            data: String::new(),
        };
        tx_add(args).unwrap();

        let state = State::load(dir.path()).unwrap();
        assert_eq!(state.balance("babayaga"), 5);
        assert_eq!(state.next_block_number(), 1);
    }

    #[test]
    fn balances_list_reads_genesis_allocation() {
        let dir = tempfile::tempdir().unwrap();
        let args = DataDirArgs { datadir: dir.path().to_path_buf() };
        balances_list(args).unwrap();
    }
}
