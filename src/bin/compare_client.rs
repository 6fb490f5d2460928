use anyhow::Context;
use clap::Parser;
use domain_compare::app::client::{ClientView, CompareClient, EXTENSIONS};
use domain_compare::utils::logger;
use domain_compare::PriceQuery;

#[derive(Parser)]
#[command(name = "compare-client")]
#[command(about = "Look up a domain's price at every registrar the service knows")]
struct Args {
    /// Domain name without the extension (e.g. "example")
    domain: String,

    /// Registry extension
    #[arg(short, long, default_value = "com", value_parser = EXTENSIONS)]
    extension: String,

    /// Base URL of the comparison service
    #[arg(long, env = "DOMAIN_COMPARE_ENDPOINT", default_value = "http://localhost:5000")]
    endpoint: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let query = match PriceQuery::new(&args.domain, &args.extension) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let client = CompareClient::new(&args.endpoint)
        .with_context(|| format!("invalid service endpoint: {}", args.endpoint))?;

    let view = client
        .search(query, |view| {
            if let ClientView::Loading { .. } = view {
                eprintln!("⏳ {}", view.render());
            }
        })
        .await;

    match view {
        ClientView::Failed { .. } => {
            eprintln!("❌ {}", view.render());
            std::process::exit(2);
        }
        _ => println!("{}", view.render()),
    }

    Ok(())
}
