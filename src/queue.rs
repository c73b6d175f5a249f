//! Blocking FIFO queues with sentinel termination, and the shared counter
//! consumers use to decide when every producer has finished.
//!
//! The protocol:
//! - the input enumerator pushes exactly one sentinel after the last input;
//! - a producer that dequeues the input sentinel puts it back once for its
//!   siblings, then pushes its own sentinel onto the task queue;
//! - a consumer that dequeues a task sentinel records it on the
//!   [`TerminationBarrier`]. Below the producer count it forwards the sentinel
//!   as a [`Slot::Relay`] and keeps draining; at or above it the sentinel is
//!   dropped and the consumer retires.
//!
//! Only producer sentinels ([`Slot::End`]) advance the count. A relay seen
//! again is not a second finished producer, so recounting it could retire the
//! pool while producers are still emitting tasks. A relay that arrives below
//! the count is parked on the barrier instead of being put back, and the
//! consumer returns to its blocking `get`. The consumer that counts the last
//! producer releases every parked relay so its idle siblings can retire.
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A queue entry: a payload, an end-of-stream marker, or a forwarded copy of
/// one.
#[derive(Debug)]
pub enum Slot<T> {
    Item(T),
    End,
    Relay,
}

/// Unbounded multi-producer multi-consumer FIFO.
///
/// Each handle owns both ends of the channel, so `get` never observes a
/// disconnect while a handle is alive; termination is purely sentinel-driven.
#[derive(Debug)]
pub struct WorkQueue<T> {
    tx: Sender<Slot<T>>,
    rx: Receiver<Slot<T>>,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn put(&self, item: T) {
        // The receiver lives in `self`, so the channel cannot be disconnected.
        let _ = self.tx.send(Slot::Item(item));
    }

    pub fn put_sentinel(&self) {
        let _ = self.tx.send(Slot::End);
    }

    pub fn put_relay(&self) {
        let _ = self.tx.send(Slot::Relay);
    }

    /// Block until an entry is available.
    pub fn get(&self) -> Slot<T> {
        self.rx.recv().unwrap_or(Slot::End)
    }

    /// Non-blocking drain of every payload currently queued. Sentinels are
    /// discarded.
    pub fn drain(&self) -> Vec<T> {
        self.rx
            .try_iter()
            .filter_map(|slot| match slot {
                Slot::Item(item) => Some(item),
                Slot::End | Slot::Relay => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// What a consumer must do with the sentinel it just dequeued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SentinelAction {
    /// Put a relay back for a sibling and keep draining.
    Forward,
    /// The relay is held by the barrier; keep draining.
    Park,
    /// Drop the sentinel, put back `release` parked relays and exit.
    Retire { release: usize },
}

#[derive(Debug, Default)]
struct BarrierState {
    finished: usize,
    parked: usize,
}

/// Lock-guarded count of producers known to have finished, plus the relays
/// held back until that count is reached.
#[derive(Debug)]
pub struct TerminationBarrier {
    producer_count: usize,
    state: Mutex<BarrierState>,
}

impl TerminationBarrier {
    pub fn new(producer_count: usize) -> Self {
        Self {
            producer_count,
            state: Mutex::new(BarrierState::default()),
        }
    }

    pub fn producer_count(&self) -> usize {
        self.producer_count
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a producer sentinel. The increment and the threshold test
    /// happen under the same lock; reaching the count hands back every
    /// parked relay.
    pub fn observe_end(&self) -> SentinelAction {
        let mut state = self.lock();
        state.finished += 1;
        if state.finished >= self.producer_count {
            SentinelAction::Retire {
                release: std::mem::take(&mut state.parked),
            }
        } else {
            SentinelAction::Forward
        }
    }

    /// Decide on a relayed sentinel without counting it. Below the count the
    /// relay is parked.
    pub fn observe_relay(&self) -> SentinelAction {
        let mut state = self.lock();
        if state.finished >= self.producer_count {
            SentinelAction::Retire { release: 0 }
        } else {
            state.parked += 1;
            SentinelAction::Park
        }
    }

    pub fn finished(&self) -> usize {
        self.lock().finished
    }

    pub fn parked(&self) -> usize {
        self.lock().parked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo_and_drain_skips_sentinels() {
        let q = WorkQueue::new();
        q.put(1);
        q.put_sentinel();
        q.put_relay();
        q.put(2);
        assert_eq!(q.len(), 4);
        assert!(matches!(q.get(), Slot::Item(1)));
        assert_eq!(q.drain(), vec![2]);
        assert!(q.is_empty());
    }

    #[test]
    fn barrier_retires_at_producer_count() {
        let barrier = TerminationBarrier::new(3);
        assert_eq!(barrier.observe_end(), SentinelAction::Forward);
        assert_eq!(barrier.observe_end(), SentinelAction::Forward);
        assert_eq!(barrier.observe_end(), SentinelAction::Retire { release: 0 });
        assert_eq!(barrier.observe_relay(), SentinelAction::Retire { release: 0 });
        assert_eq!(barrier.finished(), 3);
    }

    #[test]
    fn relays_below_the_count_are_parked_and_released_once() {
        let barrier = TerminationBarrier::new(2);
        assert_eq!(barrier.observe_end(), SentinelAction::Forward);
        assert_eq!(barrier.observe_relay(), SentinelAction::Park);
        assert_eq!(barrier.observe_relay(), SentinelAction::Park);
        assert_eq!(barrier.finished(), 1);
        assert_eq!(barrier.parked(), 2);
        assert_eq!(barrier.observe_end(), SentinelAction::Retire { release: 2 });
        assert_eq!(barrier.parked(), 0);
        assert_eq!(barrier.observe_relay(), SentinelAction::Retire { release: 0 });
    }

    #[test]
    fn single_producer_retires_immediately() {
        let barrier = TerminationBarrier::new(1);
        assert_eq!(barrier.observe_end(), SentinelAction::Retire { release: 0 });
    }
}
