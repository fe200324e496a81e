use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use quote_engine::{state, summary, Composer, OrderId, OrderState, Quote};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum View {
    Quote,
    Shipment,
    QuoteMessage,
    Reminder,
    Transport,
}

#[derive(Parser, Debug)]
#[command(name = "quote-print", about = "Print the summary or WhatsApp text of a saved order")]
struct Args {
    /// Order id (16 hex chars); used in links and to fetch from --api
    #[arg(long)]
    id: String,

    /// Order state JSON file, as written by shopper_api
    #[arg(long, conflicts_with = "api")]
    file: Option<std::path::PathBuf>,

    /// Running shopper_api to fetch the order from
    #[arg(long)]
    api: Option<String>,

    #[arg(long, value_enum, default_value_t = View::Quote)]
    view: View,

    #[arg(long, env = "SHOPPER_BASE_URL", default_value = "http://127.0.0.1:8787")]
    base_url: String,

    #[arg(long, env = "SHOPPER_NAME", default_value = "Sabi Personal Shopper")]
    shop_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let id = OrderId::parse(&args.id)?;
    let order = match (&args.file, &args.api) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            state::decode(&raw)?
        }
        (None, Some(api)) => fetch_order(api, &id).await?,
        (None, None) => return Err(anyhow!("pass --file or --api")),
    };
    println!("{}", render(&args, &id, &order)?);
    Ok(())
}

fn render(args: &Args, id: &OrderId, order: &OrderState) -> Result<String> {
    let composer = Composer::new(args.shop_name.clone(), &args.base_url);
    let text = match args.view {
        View::Quote => summary::quote_text(&Quote::for_order(order)),
        View::Shipment => summary::shipment_text(id.as_str(), &order.shipment),
        View::QuoteMessage => composer.quote(id.as_str(), order)?.text,
        View::Reminder => composer.payment_reminder(order)?.text,
        View::Transport => composer.transport_update(id.as_str(), order)?.text,
    };
    Ok(text)
}

#[cfg(feature = "remote")]
async fn fetch_order(api: &str, id: &OrderId) -> Result<OrderState> {
    let url = format!("{}/orders/{}", api.trim_end_matches('/'), id);
    let resp: serde_json::Value = reqwest::get(url).await?.error_for_status()?.json().await?;
    let st = resp.get("state").ok_or_else(|| anyhow!("response has no `state`"))?;
    Ok(state::decode_value(st)?)
}

#[cfg(not(feature = "remote"))]
async fn fetch_order(_api: &str, _id: &OrderId) -> Result<OrderState> {
    Err(anyhow!("--api requires building with --features remote"))
}
