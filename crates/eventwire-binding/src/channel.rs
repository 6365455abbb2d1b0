//! In-process channel binding: a bounded queue pair demonstrating the
//! end-of-stream contract without any I/O.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use eventwire_codec::Message;

use crate::cancel::CancelToken;
use crate::error::{Result, TransportError};
use crate::traits::{Received, Receiver, Sender};

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 64;

/// Upper bound on one blocking wait; cancellation is observed at least
/// this often.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

struct Shared {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

struct State {
    queue: VecDeque<Message>,
    senders: usize,
    receiver_alive: bool,
}

/// Create a connected sender/receiver pair with default capacity.
pub fn channel() -> (ChannelSender, ChannelReceiver) {
    channel_with_capacity(DEFAULT_CAPACITY)
}

/// Create a connected sender/receiver pair with explicit capacity.
pub fn channel_with_capacity(capacity: usize) -> (ChannelSender, ChannelReceiver) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            queue: VecDeque::new(),
            senders: 1,
            receiver_alive: true,
        }),
        not_empty: Condvar::new(),
        not_full: Condvar::new(),
        capacity: capacity.max(1),
    });
    (
        ChannelSender {
            shared: Arc::clone(&shared),
        },
        ChannelReceiver { shared },
    )
}

/// Outbound half of the in-process binding. Cloning adds a sender; the
/// receiver observes end-of-stream once every sender is dropped.
pub struct ChannelSender {
    shared: Arc<Shared>,
}

/// Inbound half of the in-process binding.
pub struct ChannelReceiver {
    shared: Arc<Shared>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, condvar: &Condvar, guard: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        match condvar.wait_timeout(guard, POLL_INTERVAL) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }
}

impl Sender for ChannelSender {
    fn send(&mut self, cancel: &CancelToken, message: Message) -> Result<()> {
        let mut state = self.shared.lock();
        loop {
            if cancel.is_cancelled() {
                return Err(TransportError::Rejected("cancelled by caller".to_string()));
            }
            if !state.receiver_alive {
                return Err(TransportError::Closed);
            }
            if state.queue.len() < self.shared.capacity {
                state.queue.push_back(message);
                self.shared.not_empty.notify_one();
                return Ok(());
            }
            state = self.shared.wait(&self.shared.not_full, state);
        }
    }
}

impl Clone for ChannelSender {
    fn clone(&self) -> Self {
        self.shared.lock().senders += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for ChannelSender {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.senders -= 1;
        if state.senders == 0 {
            // The receiver's next wakeup classifies this as end of stream.
            self.shared.not_empty.notify_all();
        }
    }
}

impl Receiver for ChannelReceiver {
    fn receive(&mut self, cancel: &CancelToken) -> Result<Received> {
        let mut state = self.shared.lock();
        loop {
            if cancel.is_cancelled() {
                return Ok(Received::EndOfStream);
            }
            if let Some(message) = state.queue.pop_front() {
                self.shared.not_full.notify_one();
                return Ok(Received::Message(message));
            }
            if state.senders == 0 {
                tracing::debug!("all channel senders dropped, ending stream");
                return Ok(Received::EndOfStream);
            }
            state = self.shared.wait(&self.shared.not_empty, state);
        }
    }
}

impl Drop for ChannelReceiver {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.receiver_alive = false;
        state.queue.clear();
        self.shared.not_full.notify_all();
    }
}
