mod otel;

use std::path::PathBuf;

use anyhow::Context as _;
use astroshop_core::{
    Config, ShopClient,
    http_client::HttpClient,
    model::{Address, CreditCardInfo},
    state::{CurrencySelection, SessionManager},
    telemetry::{Telemetry, traced_with_kind},
};
use clap::{Args, Parser, Subcommand};
use opentelemetry::Context;
use opentelemetry::trace::SpanKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Astronomy shop API client", long_about = None)]
struct Cli {
    /// Config file (JSON or TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Shop API base URL, used when no config file is given
    #[arg(long, global = true, env = "ASTROSHOP_API_URL", default_value = "http://localhost:8080/api")]
    api_url: String,
    /// Currency prices are shown in
    #[arg(long, global = true, default_value = "USD")]
    currency: String,
    /// Reuse an existing session (cart) id; a fresh one is generated otherwise
    #[arg(long, global = true, env = "ASTROSHOP_SESSION")]
    session: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the product catalog
    Products,
    /// Show one product
    Product { id: String },
    /// Show the cart for the session
    Cart,
    /// Add a product to the cart
    Add { product_id: String, quantity: i32 },
    /// Remove everything from the cart
    EmptyCart,
    /// List supported currencies
    Currencies,
    /// Quote shipping for the current cart
    Shipping {
        #[command(flatten)]
        address: AddressArgs,
    },
    /// Place an order for the current cart
    Checkout {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        address: AddressArgs,
        #[command(flatten)]
        card: CardArgs,
    },
    /// Print a fresh session id
    NewSession,
}

impl Commands {
    fn span_name(&self) -> &'static str {
        match self {
            Commands::Products => "cli.products",
            Commands::Product { .. } => "cli.product",
            Commands::Cart => "cli.cart",
            Commands::Add { .. } => "cli.add",
            Commands::EmptyCart => "cli.empty_cart",
            Commands::Currencies => "cli.currencies",
            Commands::Shipping { .. } => "cli.shipping",
            Commands::Checkout { .. } => "cli.checkout",
            Commands::NewSession => "cli.new_session",
        }
    }
}

#[derive(Args)]
struct AddressArgs {
    #[arg(long, default_value = "1600 Amphitheatre Parkway")]
    street: String,
    #[arg(long, default_value = "Mountain View")]
    city: String,
    #[arg(long, default_value = "CA")]
    state: String,
    #[arg(long, default_value = "United States")]
    country: String,
    #[arg(long, default_value = "94043")]
    zip: String,
}

impl From<AddressArgs> for Address {
    fn from(a: AddressArgs) -> Self {
        Address {
            street_address: a.street,
            city: a.city,
            state: a.state,
            country: a.country,
            zip_code: a.zip,
        }
    }
}

#[derive(Args)]
struct CardArgs {
    #[arg(long, default_value = "4432-8015-6152-0454")]
    card_number: String,
    #[arg(long, default_value_t = 672)]
    card_cvv: i32,
    #[arg(long, default_value_t = 2030)]
    card_year: i32,
    #[arg(long, default_value_t = 1)]
    card_month: i32,
}

impl From<CardArgs> for CreditCardInfo {
    fn from(c: CardArgs) -> Self {
        CreditCardInfo {
            credit_card_number: c.card_number,
            credit_card_cvv: c.card_cvv,
            credit_card_expiration_year: c.card_year,
            credit_card_expiration_month: c.card_month,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = match &cli.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::with_base_url(cli.api_url.clone()),
    };

    // The exporter owns a blocking HTTP client, so it is built and flushed
    // outside the async runtime.
    let (telemetry, guard) = otel::init(&cfg.telemetry)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    let result = runtime.block_on(start(cli.session.as_deref(), &cli.currency, &cfg, telemetry, cli.command));
    drop(runtime);

    guard.shutdown();
    result
}

async fn start(
    session: Option<&str>,
    currency: &str,
    cfg: &Config,
    telemetry: Telemetry,
    command: Commands,
) -> anyhow::Result<()> {
    let session = match session {
        Some(id) => SessionManager::with_id(id),
        None => SessionManager::new(),
    };
    let client = ShopClient::with_parts(
        &cfg.api.base_url,
        HttpClient::new(&cfg.http, telemetry)?,
        session,
        CurrencySelection::new(currency),
    )?;
    run(&client, command).await
}

async fn run(client: &ShopClient, command: Commands) -> anyhow::Result<()> {
    let name = command.span_name();
    let root = Context::new();
    traced_with_kind(
        client.telemetry(),
        &root,
        name,
        SpanKind::Internal,
        |_: &()| vec![],
        |cx| async move {
            match command {
                Commands::Products => {
                    for p in client.list_products(&cx).await? {
                        println!("{:<12} {:<48} {}", p.id, p.name, p.price_usd.format_currency());
                    }
                }
                Commands::Product { id } => {
                    let p = client.get_product(&id, &cx).await?;
                    println!("{} ({})", p.name, p.id);
                    println!("  {}", p.price_usd.format_currency());
                    println!("  categories: {}", p.categories.join(", "));
                    println!("  {}", p.description);
                }
                Commands::Cart => {
                    let cart = client.refresh_cart(&cx).await?;
                    print_cart(client, &cart);
                }
                Commands::Add {
                    product_id,
                    quantity,
                } => {
                    let cart = client.add_to_cart(&product_id, quantity, &cx).await?;
                    print_cart(client, &cart);
                }
                Commands::EmptyCart => {
                    client.empty_cart(&cx).await?;
                    println!("cart emptied for session {}", client.session().session_id());
                }
                Commands::Currencies => {
                    for code in client.list_currencies(&cx).await? {
                        println!("{code}");
                    }
                }
                Commands::Shipping { address } => {
                    client.refresh_cart(&cx).await?;
                    let cost = client.shipping_quote(&address.into(), &cx).await?;
                    println!("shipping: {}", cost.format_currency());
                }
                Commands::Checkout {
                    email,
                    address,
                    card,
                } => {
                    let session = client.session().session_id();
                    let order = client
                        .checkout(address.into(), email, card.into(), &cx)
                        .await?;
                    println!("order {} placed for session {session}", order.order_id);
                    println!("  tracking: {}", order.shipping_tracking_id);
                    for oi in &order.items {
                        println!(
                            "  {} x{} @ {}",
                            oi.item.product_id,
                            oi.item.quantity,
                            oi.cost.format_currency()
                        );
                    }
                    println!("  shipping: {}", order.shipping_cost.format_currency());
                    match order.total() {
                        Some(total) => println!("  total: {}", total.format_currency()),
                        None => println!("  total: (mixed currencies)"),
                    }
                    println!("new session {}", client.session().session_id());
                }
                Commands::NewSession => {
                    println!("{}", client.new_session());
                }
            }
            Ok(())
        },
    )
    .await?;
    Ok(())
}

fn print_cart(client: &ShopClient, cart: &astroshop_core::model::ServerCart) {
    println!("session {}", client.session().session_id());
    if cart.is_empty() {
        println!("  (empty)");
        return;
    }
    for item in &cart.items {
        println!("  {} x{}", item.product_id, item.quantity);
    }
    println!("  {} item(s)", cart.total_item_count());
}
