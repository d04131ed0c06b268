/*!
 * Read Progress Sinks
 * Receivers for the chunks a provider streams out of `read`
 */

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Receives incremental chunks of a resource
///
/// Providers call `report` once per chunk, in order. The sink must not block
/// for long; buffering or forwarding elsewhere is its own business.
pub trait ProgressSink: Send + Sync {
    fn report(&self, chunk: Bytes);
}

impl<F> ProgressSink for F
where
    F: Fn(Bytes) + Send + Sync,
{
    fn report(&self, chunk: Bytes) {
        self(chunk)
    }
}

/// Collects every chunk into one contiguous buffer
#[derive(Debug, Default)]
pub struct BufferSink {
    buffer: Mutex<BytesMut>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes received so far
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Take everything received so far, leaving the sink empty
    pub fn take(&self) -> Bytes {
        self.buffer.lock().split().freeze()
    }
}

impl ProgressSink for BufferSink {
    fn report(&self, chunk: Bytes) {
        self.buffer.lock().extend_from_slice(&chunk);
    }
}

/// Forwards chunks to an unbounded channel
///
/// Chunks reported after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<Bytes>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, chunk: Bytes) {
        let _ = self.sender.send(chunk);
    }
}
