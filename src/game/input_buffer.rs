//! Lock-free input queue between the input reader and the game loop
//!
//! The reader thread pushes semantic input events as they arrive; the loop
//! drains everything pending once per iteration, before running the tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::game::constants::feed::INPUT_QUEUE_CAPACITY;
use crate::game::session::InputEvent;

/// Bounded queue of input events
pub struct InputBuffer {
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    capacity: usize,
}

impl InputBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Create a sender handle for an input reader
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Try to submit an event (non-blocking)
    ///
    /// Returns true if successful, false if the queue is full
    #[inline]
    pub fn try_submit(&self, event: InputEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    /// Drain all pending events in arrival order
    pub fn drain(&self) -> Vec<InputEvent> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new(INPUT_QUEUE_CAPACITY)
    }
}

/// Clonable sender handle for input readers
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<InputEvent>,
}

impl InputSender {
    /// Submit an event (non-blocking)
    #[inline]
    pub fn try_send(&self, event: InputEvent) -> Result<(), InputBufferError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => InputBufferError::Full,
            TrySendError::Disconnected(_) => InputBufferError::Disconnected,
        })
    }
}

/// Input queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputBufferError {
    /// Queue is full (backpressure)
    #[error("Input queue is full")]
    Full,
    /// Game loop stopped
    #[error("Input queue disconnected")]
    Disconnected,
}
