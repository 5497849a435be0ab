//! Command-line interface for dynamo-bulk-load
//!
//! # Usage Examples
//!
//! ```bash
//! # Dry run: print three rendered items
//! dynamo-bulk-load -f demos/item.json -t my-table -n 3
//!
//! # Insert 2500 items
//! AWS_PROFILE=yourprofile dynamo-bulk-load -f demos/item.json -t my-table -n 2500 --commit
//! ```
//!
//! ## Template Variables
//! - `$UUID`: random UUID v4 per item
//! - `$NOW`: Unix seconds, plus `--offset-minutes`
//! - `$BUILD`: item number, 1..=N
//! - `$FOO`: the constant `BAR`

use clap::Parser;
use dynamo_bulk_load::{run_load, DynamoOpts};
use dynamodb_populate::LoadArgs;

const LONG_ABOUT: &str = "\
Bulk DynamoDB Templated Item Loader

Reads a JSON file as a template, substitutes the supported $variables, then inserts the
rendered items into DynamoDB.

Steps:
1) Find out the name of the table you want to insert data into.
2) Create your-template-name.json. See demos/ for reference; note the \"$\" template vars available.
3) AWS_PROFILE=yourprofile dynamo-bulk-load -t your-table-name -f your-template-name.json -n 100

Nothing is written unless --commit is given.";

#[derive(Parser)]
#[command(name = "dynamo-bulk-load")]
#[command(about = "Bulk-load templated items into a DynamoDB table")]
#[command(long_about = LONG_ABOUT)]
struct Cli {
    #[command(flatten)]
    load: LoadArgs,

    /// DynamoDB client options
    #[command(flatten)]
    dynamo: DynamoOpts,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for item output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    run_load(&cli.load, &cli.dynamo, std::io::stdout()).await?;
    Ok(())
}
