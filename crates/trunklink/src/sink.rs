//! Message delivery to downstream consumers

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::message::Message;

/// Consumer of decoded messages
///
/// Implementations receive every decoded message in decode
/// order, on the thread driving the receiver. They must not
/// block: a stalled sink stalls the signal path behind it.
///
/// Any `FnMut(Message)` closure is a sink.
pub trait MessageSink {
    /// Accept one decoded message
    fn receive(&mut self, message: Message);
}

impl<F> MessageSink for F
where
    F: FnMut(Message),
{
    fn receive(&mut self, message: Message) {
        self(message)
    }
}

/// Sink that forwards messages over a bounded channel
///
/// Decoding usually runs on its own thread; the channel hands
/// messages to whichever thread consumes them. When the
/// consumer falls behind and the channel fills, new messages
/// are counted and discarded rather than blocking the signal
/// path. Messages are also counted as dropped once the
/// consuming side has hung up.
#[derive(Clone, Debug)]
pub struct QueueSink {
    sender: Sender<Message>,
    dropped: u64,
}

impl QueueSink {
    /// Create a sink and the receiving end of its channel
    ///
    /// The channel holds at most `capacity` undelivered
    /// messages.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Message>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (Self { sender, dropped: 0 }, receiver)
    }

    /// Messages discarded because the consumer fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl MessageSink for QueueSink {
    fn receive(&mut self, message: Message) {
        match self.sender.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) | Err(TrySendError::Disconnected(message)) => {
                self.dropped = self.dropped.saturating_add(1);
                debug!("message queue full; dropping {}", message);
            }
        }
    }
}
