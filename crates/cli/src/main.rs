use clap::{Parser, Subcommand};
use quotes_core::{
    config::db_path_from_env_value, fingerprint, normalize, CoreConfig, HttpQuoteSource,
    IngestionLoop, Quote, QuoteError, QuoteId, QuoteStore,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "quotes")]
#[command(about = "Quotes store CLI")]
struct Cli {
    /// SQLite database path (defaults to $QUOTES_DB, then quotes.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the quotes table if it does not exist
    Init,
    /// Run one fetch + ingest cycle against the upstream source
    Fetch,
    /// Print the number of stored quotes
    Count,
    /// Print a random stored quote
    Random,
    /// Print the quote with the given fingerprint
    Show {
        /// 64-character quote fingerprint
        id: String,
    },
    /// Print the fingerprint of a quote without storing it
    Fingerprint {
        /// Quote text
        text: String,
        /// Quote author (optional)
        #[arg(long)]
        author: Option<String>,
    },
}

fn print_quote(quote: &Quote) {
    println!("ID: {}", quote.id);
    println!("Quote: {}", quote.text);
    println!("Author: {}", quote.author.as_deref().unwrap_or("(unknown)"));
    println!("Added: {}", quote.added_at.to_rfc3339());
}

fn open_store(db: Option<PathBuf>) -> Result<QuoteStore, QuoteError> {
    let path = db.unwrap_or_else(|| db_path_from_env_value(std::env::var("QUOTES_DB").ok()));
    let store = QuoteStore::open(&path)?;
    store.init()?;
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => match open_store(cli.db) {
            Ok(_) => println!("Quotes table ready"),
            Err(e) => eprintln!("Error initialising store: {}", e),
        },
        Some(Commands::Fetch) => {
            let cfg = CoreConfig::from_env_values(
                std::env::var("QUOTES_DB").ok(),
                std::env::var("QUOTES_SOURCE_URL").ok(),
                std::env::var("QUOTES_POLL_INTERVAL_SECS").ok(),
                std::env::var("QUOTES_FETCH_TIMEOUT_SECS").ok(),
                std::env::var("QUOTES_SHUTDOWN_GRACE_SECS").ok(),
            )?;
            let store = open_store(cli.db.or_else(|| Some(cfg.db_path().to_path_buf())))?;
            let source = HttpQuoteSource::new(cfg.source_url(), cfg.fetch_timeout())?;
            let report = IngestionLoop::new(Arc::new(store), source, cfg.poll_interval())
                .run_cycle()
                .await;

            if report.fetch_failed {
                eprintln!("Fetch from {} failed; nothing stored", cfg.source_url());
            }
            println!(
                "Fetched {}, skipped {}, inserted {}, failed {}",
                report.ingest.fetched,
                report.ingest.skipped,
                report.ingest.inserted,
                report.ingest.failed
            );
            if let Some(total) = report.total {
                println!("Total quotes: {}", total);
            }
        }
        Some(Commands::Count) => {
            let store = open_store(cli.db)?;
            match store.count() {
                Ok(total) => println!("{}", total),
                Err(e) => eprintln!("Error counting quotes: {}", e),
            }
        }
        Some(Commands::Random) => {
            let store = open_store(cli.db)?;
            match store.random() {
                Ok(quote) => print_quote(&quote),
                Err(QuoteError::NotFound) => println!("No quotes available."),
                Err(e) => eprintln!("Error reading quote: {}", e),
            }
        }
        Some(Commands::Show { id }) => {
            let id = QuoteId::parse(&id)?;
            let store = open_store(cli.db)?;
            match store.get(&id) {
                Ok(Some(quote)) => print_quote(&quote),
                Ok(None) => println!("No quote with ID: {}", id),
                Err(e) => eprintln!("Error reading quote: {}", e),
            }
        }
        Some(Commands::Fingerprint { text, author }) => {
            let author = author.as_deref();
            println!("Normalised: {}|{}", normalize(Some(&text)), normalize(author));
            println!("{}", fingerprint(Some(&text), author));
        }
        None => {
            println!("Use 'quotes --help' for commands");
        }
    }

    Ok(())
}
