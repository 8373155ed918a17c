use chimera_packs::{
    PACK_ITEM_COUNT,
    Reconciler,
    TransactionReceipt,
    catalog::http::HttpCatalogClient,
};
use clap::Parser;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    fs,
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

/// Resolve the contents of a pack purchase from its transaction receipt.
///
/// Support tool for debugging stuck purchases: feed it the receipt JSON and
/// it runs the same fallback chain the game client uses.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the catalog backend
    #[arg(short, long)]
    catalog_url: String,

    /// Path to a transaction receipt JSON file
    #[arg(short, long)]
    receipt: PathBuf,

    /// Items expected in a fully indexed pack
    #[arg(long, default_value_t = PACK_ITEM_COUNT)]
    expected_items: usize,

    /// Print resolved items as JSON instead of a summary
    #[arg(long)]
    json: bool,

    #[arg(short, long, default_value = "false")]
    tracing: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chimera_packs=debug,resolve_pack=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    if args.tracing {
        init_tracing();
    }

    let raw = fs::read_to_string(&args.receipt)
        .wrap_err_with(|| format!("reading receipt {}", args.receipt.display()))?;
    let receipt: TransactionReceipt =
        serde_json::from_str(&raw).wrap_err("invalid receipt JSON")?;
    if !receipt.succeeded {
        return Err(eyre!(
            "transaction {} reverted; there is nothing to resolve",
            receipt.transaction_hash
        ));
    }

    let catalog = HttpCatalogClient::new(&args.catalog_url)?;
    tracing::info!(catalog = %catalog, tx = %receipt.transaction_hash, "resolving purchase");
    let reconciler = Reconciler::new(catalog);
    let items = reconciler
        .resolve_purchase(&receipt, args.expected_items)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        println!(
            "resolved {} item(s) for purchaser {}:",
            items.len(),
            receipt.purchaser
        );
        for item in &items {
            println!(
                "  #{:<8} {:<24} {:?} {:?} (fusion {}, stage {})",
                item.id,
                item.display_name,
                item.rarity,
                item.category,
                item.fusion_level,
                item.evolution_stage
            );
        }
    }
    Ok(())
}
