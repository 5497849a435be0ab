//! DynamoDB populator for templated items.

use crate::batch::{BatchSession, BatchWriteClient, MAX_BATCH_WRITE_ITEMS};
use crate::error::PopulateError;
use item_template::{ItemRenderer, RenderedItem};
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Prefix for every console line when nothing is written.
pub const DRY_RUN_PREFIX: &str = "[DRY RUN] ";

/// A progress line is printed for every item index divisible by this.
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Console line prefix for a run that does (`commit`) or does not write items.
pub fn line_prefix(commit: bool) -> &'static str {
    if commit {
        ""
    } else {
        DRY_RUN_PREFIX
    }
}

/// Announce a load. Printed before the template file is opened.
pub fn write_start_line<W: Write>(
    out: &mut W,
    commit: bool,
    count: u64,
    template: &Path,
    table: &str,
) -> io::Result<()> {
    writeln!(
        out,
        "{}Batch creating {count} items using template {} into table {table}...",
        line_prefix(commit),
        template.display()
    )
}

/// Metrics from a populate operation.
#[derive(Debug, Clone, Default)]
pub struct PopulateMetrics {
    /// Number of items rendered.
    pub items_rendered: u64,
    /// Number of items confirmed written (zero in a dry run).
    pub items_written: u64,
    /// Number of BatchWriteItem requests sent.
    pub request_count: u64,
    /// Total time taken.
    pub total_duration: Duration,
    /// Time spent rendering items.
    pub render_duration: Duration,
    /// Time spent submitting items, including the final flush.
    pub write_duration: Duration,
}

impl PopulateMetrics {
    /// Calculate items rendered per second.
    pub fn items_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.items_rendered as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Renders items from a template and writes them to a DynamoDB table.
///
/// Progress, dry-run item and done lines go to `out`; the start line is
/// written separately by [`write_start_line`].
pub struct DynamoPopulator<W: Write> {
    renderer: ItemRenderer,
    table: String,
    batch_size: usize,
    out: W,
}

impl<W: Write> DynamoPopulator<W> {
    /// Create a populator for `table`, printing console lines to `out`.
    pub fn new(renderer: ItemRenderer, table: impl Into<String>, out: W) -> Self {
        Self {
            renderer,
            table: table.into(),
            batch_size: MAX_BATCH_WRITE_ITEMS,
            out,
        }
    }

    /// Set the number of items per BatchWriteItem request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Consume the populator and return the console writer.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Render `count` items and print each one instead of writing it.
    pub fn dry_run(&mut self, count: u64) -> Result<PopulateMetrics, PopulateError> {
        let start_time = Instant::now();
        let mut metrics = PopulateMetrics::default();

        for _ in 0..count {
            let item = self.render_next(DRY_RUN_PREFIX, &mut metrics)?;

            let json = serde_json::to_string(&item)?;
            writeln!(self.out, "{DRY_RUN_PREFIX}Templated item: {json}")?;
        }

        metrics.total_duration = start_time.elapsed();
        self.finish(DRY_RUN_PREFIX, &metrics)?;
        Ok(metrics)
    }

    /// Render `count` items and write them to the table through `client`.
    ///
    /// The batch session is closed on every path out of the loop, so items
    /// still buffered when rendering or a request fails are flushed before
    /// the error is returned.
    pub async fn commit<C>(
        &mut self,
        client: &C,
        count: u64,
    ) -> Result<PopulateMetrics, PopulateError>
    where
        C: BatchWriteClient + ?Sized,
    {
        let start_time = Instant::now();
        let mut metrics = PopulateMetrics::default();

        let mut session = BatchSession::open(client, self.table.clone(), self.batch_size);
        let submitted = self.submit_all(&mut session, count, &mut metrics).await;

        let flush_start = Instant::now();
        let closed = session.close().await;
        metrics.write_duration += flush_start.elapsed();

        submitted?;
        let stats = closed?;
        metrics.items_written = stats.items_written;
        metrics.request_count = stats.request_count;

        metrics.total_duration = start_time.elapsed();
        self.finish("", &metrics)?;
        Ok(metrics)
    }

    async fn submit_all<C>(
        &mut self,
        session: &mut BatchSession<'_, C>,
        count: u64,
        metrics: &mut PopulateMetrics,
    ) -> Result<(), PopulateError>
    where
        C: BatchWriteClient + ?Sized,
    {
        for _ in 0..count {
            let item = self.render_next("", metrics)?;

            let write_start = Instant::now();
            session.put_item(item).await?;
            metrics.write_duration += write_start.elapsed();
        }
        Ok(())
    }

    fn render_next(
        &mut self,
        prefix: &str,
        metrics: &mut PopulateMetrics,
    ) -> Result<RenderedItem, PopulateError> {
        let index = self.renderer.current_index() + 1;
        if index % PROGRESS_INTERVAL == 0 {
            writeln!(self.out, "{prefix}Batch putting item {index}")?;
        }

        let render_start = Instant::now();
        let item = self.renderer.next_item()?;
        metrics.render_duration += render_start.elapsed();
        metrics.items_rendered += 1;
        Ok(item)
    }

    fn finish(&mut self, prefix: &str, metrics: &PopulateMetrics) -> Result<(), PopulateError> {
        info!(
            "Population of '{}' from {} complete: {} items rendered, {} written in {} requests, {:?} ({:.2} items/sec)",
            self.table,
            self.renderer.template().source(),
            metrics.items_rendered,
            metrics.items_written,
            metrics.request_count,
            metrics.total_duration,
            metrics.items_per_second()
        );
        writeln!(self.out, "{prefix}Done.")?;
        self.out.flush()?;
        Ok(())
    }
}
