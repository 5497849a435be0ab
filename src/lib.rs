//! dynamo-bulk-load library
//!
//! Bulk-loads templated items into a DynamoDB table.
//!
//! A JSON template with `$UUID`, `$NOW`, `$BUILD` and `$FOO` placeholders is
//! rendered N times and each item is written through batched `BatchWriteItem`
//! requests. Without `--commit` the items are only printed.
//!
//! # CLI Usage
//!
//! ```bash
//! # Preview three items
//! dynamo-bulk-load -f item.json -t my-table -n 3
//!
//! # Write 10k items using a named AWS profile
//! AWS_PROFILE=dev dynamo-bulk-load -f item.json -t my-table -n 10000 --commit
//!
//! # Write against DynamoDB Local
//! dynamo-bulk-load -f item.json -t my-table -n 100 --commit \
//!   --endpoint-url http://localhost:8000 --region us-east-1
//! ```

use anyhow::Context;
use clap::Parser;
use dynamodb_populate::{write_start_line, DynamoPopulator, LoadArgs, PopulateMetrics};
use item_template::{ItemRenderer, Template, PLACEHOLDER_NAMES};
use std::io::Write;
use tracing::warn;

pub mod connect;

pub use connect::connect_to_dynamodb;

#[derive(Parser, Clone, Debug)]
pub struct DynamoOpts {
    /// AWS region (defaults to the ambient AWS configuration)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// DynamoDB endpoint URL override (e.g. DynamoDB Local)
    #[arg(long, env = "DYNAMODB_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Maximum attempts per request, including throttling retries
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_attempts: u32,
}

/// Render and load items as described by `args`, printing console lines to `out`.
///
/// The start line is printed before the template is opened. A DynamoDB client
/// is only created when `args.commit` is set.
pub async fn run_load<W: Write>(
    args: &LoadArgs,
    opts: &DynamoOpts,
    mut out: W,
) -> anyhow::Result<PopulateMetrics> {
    write_start_line(&mut out, args.commit, args.number, &args.file, &args.table)?;

    let template = Template::from_file(&args.file)
        .with_context(|| format!("Failed to load template from {:?}", args.file))?;
    let renderer = ItemRenderer::new(template).with_offset_minutes(args.offset_minutes);

    let unsupported = renderer.unsupported_placeholders();
    if !unsupported.is_empty() {
        warn!(
            "Template {} uses unsupported placeholders {:?} (supported: {:?})",
            args.file.display(),
            unsupported,
            PLACEHOLDER_NAMES
        );
    }
    let mut populator =
        DynamoPopulator::new(renderer, &args.table, out).with_batch_size(args.batch_size);

    if !args.commit {
        return populator
            .dry_run(args.number)
            .context("Dry run failed");
    }

    let client = connect_to_dynamodb(opts).await;
    populator
        .commit(&client, args.number)
        .await
        .with_context(|| format!("Failed to load items into table '{}'", args.table))
}
