//! Bounded channel feed between a producer thread and the pipeline loop

use crate::data::Reading;
use crate::error::{PipelineError, Result};
use std::sync::mpsc::{self, Receiver, SyncSender};

/// Producer half; blocks while the feed is full
#[derive(Debug, Clone)]
pub struct FeedSender {
    sender: SyncSender<Reading>,
}

impl FeedSender {
    /// Deliver one reading, waiting for room in the buffer
    pub fn send(&self, reading: Reading) -> Result<()> {
        self.sender
            .send(reading)
            .map_err(|_| PipelineError::FeedClosed)
    }
}

/// Consumer half; iterates until every sender is dropped
#[derive(Debug)]
pub struct ReadingFeed {
    receiver: Receiver<Reading>,
}

impl Iterator for ReadingFeed {
    type Item = Reading;

    fn next(&mut self) -> Option<Reading> {
        self.receiver.recv().ok()
    }
}

/// Create a feed holding at most `capacity` undelivered readings
pub fn bounded_feed(capacity: usize) -> (FeedSender, ReadingFeed) {
    let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
    (FeedSender { sender }, ReadingFeed { receiver })
}
