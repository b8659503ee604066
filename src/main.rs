use anyhow::Result;
use clap::{Parser, Subcommand};

use tideway::chain::{Address, TokenId};
use tideway::shared::config::WalletConfig;
use tideway::shared::types::ProviderId;
use tideway::{SwapRequest, SwapService};

#[derive(Parser, Debug)]
#[command(version, about = "Swap orchestration core CLI for Move-network wallets")]
struct Args {
    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,

    /// Active wallet address
    #[arg(long, default_value = "0x0")]
    sender: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered swap providers in fallback order
    Providers,

    /// Fetch and print aggregated quotes for a pair
    Quote {
        #[arg(long)]
        token_in: String,

        #[arg(long)]
        token_out: String,

        /// Input amount in base units
        #[arg(long)]
        amount: u64,
    },

    /// Print the cached token registry
    Tokens,

    /// Look up coin metadata for a token type
    Coin {
        #[arg(long)]
        token: String,
    },

    /// Build a swap and print the signing payload without executing
    Build {
        #[arg(long)]
        token_in: String,

        #[arg(long)]
        token_out: String,

        /// Input amount in base units
        #[arg(long)]
        amount: u64,

        /// Slippage tolerance in basis points
        #[arg(long)]
        slippage_bps: Option<u32>,

        /// Preferred provider to try first
        #[arg(long, default_value = "aftermath")]
        provider: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => WalletConfig::from_file(path)?,
        None => WalletConfig::default(),
    };
    let sender: Address = args.sender.parse()?;

    let (service, _batch_notifications) = SwapService::with_fullnode(&config, sender);

    match args.command {
        Command::Providers => {
            for (position, id) in service.providers().iter().enumerate() {
                println!("{}. {}", position + 1, id);
            }
        }

        Command::Quote {
            token_in,
            token_out,
            amount,
        } => {
            let token_in = TokenId::new(token_in);
            let token_out = TokenId::new(token_out);
            let quotes = service.get_quotes(&token_in, &token_out, amount).await?;

            println!(
                "{} quote(s) for {} {} -> {}",
                quotes.len(),
                amount,
                token_in,
                token_out
            );
            for quote in &quotes {
                println!(
                    "  {:<10} out {:>16}  impact {} bps  routes {}",
                    quote.provider.to_string(),
                    quote.amount_out,
                    quote.price_impact_bps,
                    quote.routes.len()
                );
            }
        }

        Command::Tokens => {
            let tokens = service.token_registry().tokens().await?;
            for token in tokens {
                println!(
                    "{:<8} {:>3} decimals  {}",
                    token.symbol, token.decimals, token.coin_type
                );
            }
        }

        Command::Coin { token } => {
            let token = TokenId::new(token);
            let metadata = service.coin_metadata(&token).await?;
            println!("{} ({})", metadata.symbol, metadata.name);
            println!("  decimals: {}", metadata.decimals);
            if let Some(icon) = metadata.icon_url {
                println!("  icon:     {}", icon);
            }
        }

        Command::Build {
            token_in,
            token_out,
            amount,
            slippage_bps,
            provider,
        } => {
            let preferred: ProviderId = provider.parse()?;
            let built = service
                .build_swap(SwapRequest {
                    token_in: TokenId::new(token_in),
                    token_out: TokenId::new(token_out),
                    amount_in: amount,
                    slippage_bps,
                    preferred_provider: preferred,
                    quote: None,
                })
                .await?;

            println!("Built via {}:", built.quote.provider);
            println!("  amount in:      {}", built.quote.amount_in);
            println!("  estimated out:  {}", built.quote.amount_out);
            println!("  minimum out:    {}", built.slippage.min_amount_out);

            let payload = service.prepare_for_signing(built.transaction).await?;
            println!("Signing payload:");
            println!("  tx bytes: {}", payload.tx_bytes_b64());
            println!("  intent:   {}", payload.intent_b64());
            println!("  digest:   {}", payload.digest_b64());
            println!("Hand the digest to the session signer to execute.");
        }
    }

    Ok(())
}
