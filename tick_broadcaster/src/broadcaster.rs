//! Time-paced fan-out of replayed batches.
//!
//! The `Broadcaster` pulls one batch per interval from a `BatchSource`, stamps it with the
//! generation time and publishes it through a `SubscriberHub`. A round that fails is
//! logged and followed by a short pause; the loop itself only ends on shutdown.
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, after, select, tick};
use log::{error, info};
use tick_common::feed::{Batch, FeedMessage};
use tick_common::{Result, SubscriberHub};

use crate::model::replay_cursor::ReplayCursor;

/// Default pause between rounds.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
/// Default pause after a failed round.
pub const DEFAULT_ERROR_DELAY: Duration = Duration::from_secs(10);

/// Anything that can hand out the next batch to broadcast.
pub trait BatchSource {
    /// Produce the next batch.
    fn next_batch(&mut self) -> Result<Batch>;
}

impl BatchSource for ReplayCursor {
    fn next_batch(&mut self) -> Result<Batch> {
        Ok(ReplayCursor::next_batch(self))
    }
}

/// Pacing of the broadcast loop.
#[derive(Debug, Clone, Copy)]
pub struct BroadcasterConfig {
    /// Time between two rounds.
    pub interval: Duration,
    /// Pause after a failed round before the loop resumes.
    pub error_delay: Duration,
}

/// Drives a `BatchSource` into a `SubscriberHub`.
pub struct Broadcaster<S> {
    source: S,
    hub: SubscriberHub,
    config: BroadcasterConfig,
}

impl<S: BatchSource> Broadcaster<S> {
    /// Create a broadcaster publishing `source` batches to `hub`.
    pub fn new(source: S, hub: SubscriberHub, config: BroadcasterConfig) -> Self {
        Self {
            source,
            hub,
            config,
        }
    }

    /// Run a single round: produce, encode and publish one batch.
    ///
    /// Returns the number of subscribers that received it.
    pub fn round(&mut self) -> Result<usize> {
        let batch = self.source.next_batch()?;
        let stocks = batch.stocks.len();
        let payload = FeedMessage::new(batch).to_json()?;
        let delivered = self.hub.publish(Arc::from(payload));
        info!("Broadcast data for {} stocks to {} subscribers", stocks, delivered);
        Ok(delivered)
    }

    /// Broadcast until `shutdown` fires or its sender is dropped.
    ///
    /// The first round runs immediately so early subscribers get a current batch.
    pub fn run(mut self, shutdown: Receiver<()>) {
        let ticker = tick(self.config.interval);
        loop {
            if let Err(e) = self.round() {
                error!("Error in broadcast round: {}", e);
                select! {
                    recv(shutdown) -> _ => break,
                    recv(after(self.config.error_delay)) -> _ => {},
                }
            }
            select! {
                recv(shutdown) -> _ => break,
                recv(ticker) -> _ => {},
            }
        }
        info!("Broadcaster stopped");
    }
}
