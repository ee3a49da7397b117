use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reqwest::Client;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSimulateTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use tracing::info;

use solana_tx_resolver::{
    monitoring, tokens, BuilderClient, CanonicalTransaction, Config, IntentKind, Resolver, TokenDirectory,
    TradeIntent,
};

#[derive(Parser, Debug)]
#[command(version, about = "Resolve spot/leverage trades into unsigned Solana transactions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a spot trade transaction
    Spot(TradeArgs),
    /// Build a leveraged position transaction
    Leverage(TradeArgs),
    /// List tradable tokens
    Tokens {
        #[arg(short, long)]
        query: Option<String>,
        /// Built-in top five by 24h volume
        #[arg(long, conflicts_with_all = ["query", "meme"])]
        trending: bool,
        /// Built-in tokens tagged "meme"
        #[arg(long, conflicts_with = "query")]
        meme: bool,
    },
}

#[derive(Args, Debug)]
struct TradeArgs {
    #[arg(long)]
    mint: String,
    #[arg(long, env = "TXR_WALLET")]
    wallet: String,
    /// Decimal amount, e.g. 1.5
    #[arg(long)]
    amount: String,
    /// Run simulateTransaction against the configured RPC before printing
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load local .env if present (no-op in prod/systemd envs)
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let cfg = Config::from_env()?;
    monitoring::init_tracing(cfg.log_json);
    info!(?cfg, "boot");

    let http = Client::builder().build().context("building http client")?;

    match cli.command {
        Command::Spot(args) => trade(&cfg, http, IntentKind::Spot, args).await,
        Command::Leverage(args) => trade(&cfg, http, IntentKind::Leverage, args).await,
        Command::Tokens { query, trending, meme } => {
            let tokens = if trending {
                tokens::trending_tokens()
            } else if meme {
                tokens::meme_tokens()
            } else {
                TokenDirectory::new(&cfg, http).search(query.as_deref()).await
            };
            println!("{}", serde_json::to_string_pretty(&tokens)?);
            Ok(())
        }
    }
}

async fn trade(cfg: &Config, http: Client, kind: IntentKind, args: TradeArgs) -> Result<()> {
    let resolver = Resolver::new(BuilderClient::new(cfg, http), cfg.decode_policy());
    let intent = TradeIntent::new(kind, args.mint, args.wallet, args.amount);

    let tx = resolver
        .resolve(&intent)
        .await
        .with_context(|| format!("resolving {kind} trade for {}", intent.mint))?;

    println!("encoding:   {}", tx.encoding());
    println!(
        "fee payer:  {}",
        tx.fee_payer().map(|p| p.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("signatures: {}", tx.signatures().len());
    println!("tx:         {}", tx.to_base64()?);

    if args.simulate {
        simulate(cfg, &tx).await?;
    }
    Ok(())
}

/// Preflight only: nothing is signed or sent.
async fn simulate(cfg: &Config, tx: &CanonicalTransaction) -> Result<()> {
    let rpc = RpcClient::new_with_commitment(cfg.rpc_http_url.clone(), CommitmentConfig::confirmed());
    let sim_cfg = RpcSimulateTransactionConfig {
        sig_verify: false,
        replace_recent_blockhash: true,
        commitment: Some(CommitmentConfig::processed()),
        ..RpcSimulateTransactionConfig::default()
    };

    let sim = match tx {
        CanonicalTransaction::Legacy(tx) => rpc.simulate_transaction_with_config(tx, sim_cfg).await?,
        CanonicalTransaction::Versioned(tx) => rpc.simulate_transaction_with_config(tx, sim_cfg).await?,
    };

    match sim.value.err {
        Some(err) => println!("simulation: failed ({err:?})"),
        None => println!(
            "simulation: ok ({} compute units)",
            sim.value.units_consumed.unwrap_or_default()
        ),
    }
    for line in sim.value.logs.unwrap_or_default() {
        info!(%line, "simulate.log");
    }
    Ok(())
}
