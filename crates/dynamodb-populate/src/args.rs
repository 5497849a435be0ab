//! CLI argument definitions for the DynamoDB populator.

use crate::batch::MAX_BATCH_WRITE_ITEMS;
use clap::builder::{NonEmptyStringValueParser, RangedU64ValueParser};
use clap::{ArgAction, Args};
use std::path::PathBuf;

/// Largest accepted `$NOW` offset, in minutes (about 100 years).
pub const MAX_OFFSET_MINUTES: i64 = 100 * 365 * 24 * 60;

/// Arguments controlling what is rendered and where it is written.
#[derive(Args, Clone, Debug)]
pub struct LoadArgs {
    /// Path to the JSON item template
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Name of the DynamoDB table to write into
    #[arg(long, short = 't', value_parser = NonEmptyStringValueParser::new())]
    pub table: String,

    /// Number of items to insert
    #[arg(long, short = 'n', value_parser = clap::value_parser!(u64).range(1..))]
    pub number: u64,

    /// Write to DynamoDB (without this, items are only printed)
    #[arg(
        long,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub commit: bool,

    /// Minutes added to the current time for $NOW (e.g. for expiry attributes)
    #[arg(
        long,
        default_value = "0",
        env = "DYNAMO_LOAD_OFFSET_MINUTES",
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i64).range(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES)
    )]
    pub offset_minutes: i64,

    /// Items per BatchWriteItem request
    #[arg(
        long,
        default_value_t = MAX_BATCH_WRITE_ITEMS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_BATCH_WRITE_ITEMS as u64)
    )]
    pub batch_size: usize,
}
