//! Many-producer, single-consumer hand-off of path snapshots.
//!
//! Updates from one sender arrive in the order they were published. Across
//! senders only arrival order is defined, so consumers key on `WorkerId`.

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use simplexwatch_core::{ChannelCapacity, ChannelError, PathUpdate};
use std::time::Duration;

/// Create a connected sender/receiver pair.
///
/// With `ChannelCapacity::Bounded(n)` a publisher blocks while `n` updates
/// are pending; nothing is ever dropped. A capacity of zero is treated as 1.
pub fn path_channel(capacity: ChannelCapacity) -> (PathSender, PathReceiver) {
    let (tx, rx) = match capacity {
        ChannelCapacity::Unbounded => unbounded(),
        ChannelCapacity::Bounded(n) => bounded(n.max(1)),
    };
    (PathSender { tx }, PathReceiver { rx })
}

/// Publishing half; clone one per worker.
#[derive(Clone, Debug)]
pub struct PathSender {
    tx: Sender<PathUpdate>,
}

impl PathSender {
    /// Hand an update to the consumer, waiting for space if bounded.
    ///
    /// Fails only when the receiver has been dropped.
    pub fn publish(&self, update: PathUpdate) -> Result<(), ChannelError> {
        self.tx.send(update).map_err(|_| ChannelError::Closed)
    }
}

/// Consuming half, owned by the render loop.
#[derive(Debug)]
pub struct PathReceiver {
    rx: Receiver<PathUpdate>,
}

impl PathReceiver {
    /// Next update, or `None` once `timeout` elapses with nothing pending.
    ///
    /// Returns `None` immediately when every sender is gone and the queue is
    /// drained.
    pub fn try_take(&self, timeout: Duration) -> Option<PathUpdate> {
        match self.rx.recv_timeout(timeout) {
            Ok(update) => Some(update),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }
}
