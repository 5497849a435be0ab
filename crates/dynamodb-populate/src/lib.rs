//! DynamoDB populator for templated items.
//!
//! Renders items with [`item_template::ItemRenderer`] and either writes them
//! to a table through a [`BatchSession`] or prints them (dry run).
//!
//! # Example
//!
//! ```ignore
//! use dynamodb_populate::DynamoPopulator;
//! use item_template::{ItemRenderer, Template};
//!
//! let renderer = ItemRenderer::new(Template::from_file("item.json")?);
//! let mut populator = DynamoPopulator::new(renderer, "my-table", std::io::stdout());
//!
//! let metrics = populator.commit(&client, 1000).await?;
//! println!("Wrote {} items in {} requests", metrics.items_written, metrics.request_count);
//! ```

pub mod args;
pub mod attributes;
pub mod batch;
pub mod error;
pub mod populator;

pub use args::LoadArgs;
pub use batch::{
    BatchSession, BatchWriteClient, SessionStats, MAX_BATCH_WRITE_ITEMS, MAX_STALLED_ROUNDS,
};
pub use error::PopulateError;
pub use populator::{
    line_prefix, write_start_line, DynamoPopulator, PopulateMetrics, DRY_RUN_PREFIX,
    PROGRESS_INTERVAL,
};
