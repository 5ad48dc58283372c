//! Event notification queue owned by a configured unit.
//!
//! The unit owns the [`EventQueue`]; the vendor driver only ever receives an
//! [`EventSender`], which holds a weak reference. Once the unit drops its
//! queue (teardown, re-setup, failed setup) the buffer is freed and later
//! posts are refused.

use std::collections::TryReserveError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Notifications a vendor driver can deliver for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2sEvent {
    /// A transmit DMA buffer was consumed.
    TxDone,
    /// A receive DMA buffer was filled.
    RxDone,
    /// The DMA engine reported an error.
    DmaError,
}

type Buffer = Mutex<VecDeque<I2sEvent>>;

/// Consumer side of a unit's event queue.
#[derive(Debug)]
pub struct EventQueue {
    buffer: Arc<Buffer>,
    capacity: usize,
}

/// Producer side handed to the vendor driver at install time.
#[derive(Debug, Clone)]
pub struct EventSender {
    buffer: Weak<Buffer>,
    capacity: usize,
}

impl EventQueue {
    /// Allocates a queue for `capacity` events.
    ///
    /// The storage is reserved up front so that delivery never allocates.
    pub fn with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut events = VecDeque::new();
        events.try_reserve_exact(capacity)?;
        Ok(Self {
            buffer: Arc::new(Mutex::new(events)),
            capacity,
        })
    }

    /// A producer handle for this queue.
    pub fn sender(&self) -> EventSender {
        EventSender {
            buffer: Arc::downgrade(&self.buffer),
            capacity: self.capacity,
        }
    }

    /// Number of events the queue holds before dropping the oldest.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events waiting.
    pub fn len(&self) -> usize {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the oldest pending event, if any.
    pub fn try_recv(&self) -> Option<I2sEvent> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

impl EventSender {
    /// Delivers `event`, dropping the oldest pending event when full.
    ///
    /// Returns `false` if the owning unit has already released its queue.
    pub fn post(&self, event: I2sEvent) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let Some(buffer) = self.buffer.upgrade() else {
            return false;
        };
        let mut events = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
        true
    }

    /// Whether the owning unit still holds the queue.
    pub fn is_connected(&self) -> bool {
        self.buffer.strong_count() > 0
    }
}
