//! Batched writes to a DynamoDB table.
//!
//! A [`BatchSession`] accepts items one at a time, groups them into
//! `BatchWriteItem` requests of up to [`MAX_BATCH_WRITE_ITEMS`], and re-queues
//! anything the service reports as unprocessed, waiting with capped
//! exponential backoff before the next request. Throttled requests are retried
//! by the SDK's retry policy. Call [`BatchSession::close`] to flush the remainder.

use crate::attributes::to_attributes;
use crate::error::PopulateError;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{PutRequest, WriteRequest};
use item_template::RenderedItem;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum number of write requests DynamoDB accepts in one `BatchWriteItem` call.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Consecutive requests that may return every item unprocessed before giving up.
pub const MAX_STALLED_ROUNDS: u32 = 10;

/// Wait after the first request that returns unprocessed items.
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Upper bound for the wait between requests that return unprocessed items.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Backoff before resending unprocessed items, doubling per attempt (0-based).
pub fn retry_delay(attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    INITIAL_RETRY_DELAY
        .checked_mul(factor)
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

/// The `BatchWriteItem` operation for a single table.
#[async_trait]
pub trait BatchWriteClient: Send + Sync {
    /// Send one request and return the write requests the service left unprocessed.
    async fn batch_write(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, PopulateError>;
}

#[async_trait]
impl BatchWriteClient for aws_sdk_dynamodb::Client {
    async fn batch_write(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, PopulateError> {
        let output = self
            .batch_write_item()
            .request_items(table, requests)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;

        Ok(output
            .unprocessed_items
            .and_then(|mut unprocessed| unprocessed.remove(table))
            .unwrap_or_default())
    }
}

/// Counters for a batch session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Items accepted by `put_item`.
    pub items_put: u64,
    /// Items the service confirmed as written.
    pub items_written: u64,
    /// `BatchWriteItem` requests sent.
    pub request_count: u64,
    /// Items that came back unprocessed and were queued again.
    pub items_resent: u64,
}

/// An open batch-write session against one table.
pub struct BatchSession<'c, C: BatchWriteClient + ?Sized> {
    client: &'c C,
    table: String,
    batch_size: usize,
    buffer: VecDeque<WriteRequest>,
    stalled_rounds: u32,
    /// Requests in a row that returned unprocessed items
    retry_attempt: u32,
    stats: SessionStats,
}

impl<'c, C: BatchWriteClient + ?Sized> BatchSession<'c, C> {
    /// Open a session writing to `table` in requests of `batch_size` items.
    ///
    /// `batch_size` is clamped to `1..=MAX_BATCH_WRITE_ITEMS`.
    pub fn open(client: &'c C, table: impl Into<String>, batch_size: usize) -> Self {
        let table = table.into();
        let batch_size = batch_size.clamp(1, MAX_BATCH_WRITE_ITEMS);
        info!(
            "Opened batch session for table '{}' (batch size: {})",
            table, batch_size
        );
        Self {
            client,
            table,
            batch_size,
            buffer: VecDeque::with_capacity(batch_size),
            stalled_rounds: 0,
            retry_attempt: 0,
            stats: SessionStats::default(),
        }
    }

    /// Number of write requests buffered and not yet confirmed.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Get the session counters so far.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Queue an item, sending a request once a full batch is buffered.
    pub async fn put_item(&mut self, item: RenderedItem) -> Result<(), PopulateError> {
        let put = PutRequest::builder()
            .set_item(Some(to_attributes(item)?))
            .build()?;
        self.buffer
            .push_back(WriteRequest::builder().put_request(put).build());
        self.stats.items_put += 1;

        while self.buffer.len() >= self.batch_size {
            self.send_batch().await?;
        }
        Ok(())
    }

    /// Flush everything still buffered and end the session.
    pub async fn close(mut self) -> Result<SessionStats, PopulateError> {
        while !self.buffer.is_empty() {
            self.send_batch().await?;
        }

        info!(
            "Closed batch session for table '{}': {} items written in {} requests ({} resent)",
            self.table,
            self.stats.items_written,
            self.stats.request_count,
            self.stats.items_resent
        );
        Ok(self.stats.clone())
    }

    async fn send_batch(&mut self) -> Result<(), PopulateError> {
        let take = self.batch_size.min(self.buffer.len());
        let batch: Vec<WriteRequest> = self.buffer.drain(..take).collect();

        debug!(
            "Sending BatchWriteItem request {} with {} items to '{}'",
            self.stats.request_count + 1,
            take,
            self.table
        );
        let unprocessed = self.client.batch_write(&self.table, batch).await?;
        self.stats.request_count += 1;

        let returned = unprocessed.len().min(take);
        let written = take - returned;
        self.stats.items_written += written as u64;

        let any_unprocessed = !unprocessed.is_empty();
        if any_unprocessed {
            warn!(
                "{} of {} items unprocessed by '{}', queueing them again",
                unprocessed.len(),
                take,
                self.table
            );
            self.stats.items_resent += unprocessed.len() as u64;
            // Unprocessed items go out first in the next request.
            for request in unprocessed.into_iter().rev() {
                self.buffer.push_front(request);
            }
        }

        if written == 0 {
            self.stalled_rounds += 1;
            if self.stalled_rounds >= MAX_STALLED_ROUNDS {
                return Err(PopulateError::Unprocessed {
                    pending: self.buffer.len(),
                    rounds: self.stalled_rounds,
                });
            }
        } else {
            self.stalled_rounds = 0;
        }

        if any_unprocessed {
            let delay = retry_delay(self.retry_attempt);
            self.retry_attempt = self.retry_attempt.saturating_add(1);
            debug!(
                "Waiting {:?} before resending {} items to '{}'",
                delay,
                self.buffer.len(),
                self.table
            );
            tokio::time::sleep(delay).await;
        } else {
            self.retry_attempt = 0;
        }
        Ok(())
    }
}

impl<C: BatchWriteClient + ?Sized> Drop for BatchSession<'_, C> {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            warn!(
                "Batch session for table '{}' dropped with {} unsent items",
                self.table,
                self.buffer.len()
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{build_of, FakeClient};
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn item(build: u64) -> RenderedItem {
        match json!({"pk": format!("item-{build}"), "build": build, "tags": ["a", "b"]}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_full_batches_sent_on_put() {
        let client = FakeClient::default();
        let mut session = BatchSession::open(&client, "items", 25);

        for build in 1..=60 {
            session.put_item(item(build)).await.unwrap();
        }
        assert_eq!(client.request_sizes(), vec![25, 25]);
        assert_eq!(session.pending(), 10);

        let stats = session.close().await.unwrap();
        assert_eq!(client.request_sizes(), vec![25, 25, 10]);
        assert_eq!(stats.items_put, 60);
        assert_eq!(stats.items_written, 60);
        assert_eq!(stats.request_count, 3);
        assert_eq!(client.sent_builds(), (1..=60).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_close_without_items_sends_nothing() {
        let client = FakeClient::default();
        let session = BatchSession::open(&client, "items", 25);

        let stats = session.close().await.unwrap();
        assert_eq!(stats, SessionStats::default());
        assert!(client.request_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_batch_size_is_clamped() {
        let client = FakeClient::default();
        let mut session = BatchSession::open(&client, "items", 100);

        for build in 1..=30 {
            session.put_item(item(build)).await.unwrap();
        }
        session.close().await.unwrap();
        assert_eq!(client.request_sizes(), vec![25, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unprocessed_items_are_resent_first() {
        let client = FakeClient {
            unprocessed_per_request: Mutex::new(vec![3]),
            ..Default::default()
        };
        let mut session = BatchSession::open(&client, "items", 10);

        for build in 1..=20 {
            session.put_item(item(build)).await.unwrap();
        }
        let stats = session.close().await.unwrap();

        let requests = client.requests.lock().unwrap().clone();
        // First request held back items 8, 9, 10; they lead the next request.
        let second: Vec<u64> = requests[1].iter().map(build_of).collect();
        assert_eq!(&second[..3], &[8, 9, 10]);

        assert_eq!(stats.items_written, 20);
        assert_eq!(stats.items_resent, 3);

        let mut written: Vec<u64> = client.sent_builds();
        written.sort_unstable();
        written.dedup();
        assert_eq!(written, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_unprocessed_items_fail() {
        let client = FakeClient {
            always_unprocessed: true,
            ..Default::default()
        };
        let mut session = BatchSession::open(&client, "items", 5);

        for build in 1..=4 {
            session.put_item(item(build)).await.unwrap();
        }
        let err = session.close().await.unwrap_err();

        assert!(matches!(
            err,
            PopulateError::Unprocessed {
                pending: 4,
                rounds: MAX_STALLED_ROUNDS
            }
        ));
        assert_eq!(client.request_sizes().len(), MAX_STALLED_ROUNDS as usize);
    }

    #[test]
    fn test_retry_delay_doubles_up_to_cap() {
        assert_eq!(retry_delay(0), Duration::from_millis(100));
        assert_eq!(retry_delay(1), Duration::from_millis(200));
        assert_eq!(retry_delay(4), Duration::from_millis(1600));
        assert_eq!(retry_delay(6), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(40), MAX_RETRY_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unprocessed_items_wait_before_resend() {
        let client = FakeClient {
            always_unprocessed: true,
            ..Default::default()
        };
        let mut session = BatchSession::open(&client, "items", 5);
        session.put_item(item(1)).await.unwrap();

        let started = Instant::now();
        session.close().await.unwrap_err();

        // No wait after the request that gives up.
        let expected: Duration = (0..MAX_STALLED_ROUNDS - 1).map(retry_delay).sum();
        assert_eq!(expected, Duration::from_millis(21_300));
        assert!(started.elapsed() >= expected);
        assert!(started.elapsed() < expected + MAX_RETRY_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_resets_after_clean_request() {
        let client = FakeClient {
            unprocessed_per_request: Mutex::new(vec![2, 2, 0, 1]),
            ..Default::default()
        };
        let mut session = BatchSession::open(&client, "items", 5);
        for build in 1..=5 {
            session.put_item(item(build)).await.unwrap();
        }

        let started = Instant::now();
        for build in 6..=13 {
            session.put_item(item(build)).await.unwrap();
        }
        session.close().await.unwrap();

        // 200ms after request 2, nothing after 3, then 100ms again after 4.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(400));
        assert_eq!(client.request_sizes(), vec![5, 5, 5, 2, 1]);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_drop_with_unsent_items_warns() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let client = FakeClient::default();
        let mut session = BatchSession::open(&client, "items", 10);
        for build in 1..=3 {
            session.put_item(item(build)).await.unwrap();
        }
        drop(session);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("Batch session for table 'items' dropped with 3 unsent items"));
        assert!(client.request_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_closed_session_does_not_warn() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let client = FakeClient::default();
        let mut session = BatchSession::open(&client, "items", 10);
        session.put_item(item(1)).await.unwrap();
        session.close().await.unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(!output.contains("unsent items"));
        assert_eq!(client.request_sizes(), vec![1]);
    }

    #[tokio::test]
    async fn test_client_error_propagates() {
        let client = FakeClient::failing_on(2);
        let mut session = BatchSession::open(&client, "items", 5);

        for build in 1..=5 {
            session.put_item(item(build)).await.unwrap();
        }
        for build in 6..=9 {
            session.put_item(item(build)).await.unwrap();
        }
        let err = session.put_item(item(10)).await.unwrap_err();

        assert!(matches!(err, PopulateError::DynamoDB(_)));
        assert_eq!(session.stats().items_written, 5);
    }

    #[tokio::test]
    async fn test_attribute_conversion() {
        let client = FakeClient::default();
        let mut session = BatchSession::open(&client, "items", 1);

        session.put_item(item(7)).await.unwrap();
        session.close().await.unwrap();

        let requests = client.requests.lock().unwrap();
        let attributes = requests[0][0].put_request().unwrap().item();
        assert_eq!(attributes.get("pk"), Some(&AttributeValue::S("item-7".into())));
        assert_eq!(attributes.get("build"), Some(&AttributeValue::N("7".into())));
        assert_eq!(
            attributes.get("tags"),
            Some(&AttributeValue::L(vec![
                AttributeValue::S("a".into()),
                AttributeValue::S("b".into())
            ]))
        );
    }
}
