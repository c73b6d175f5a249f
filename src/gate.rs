//! Level-triggered start gate between grid-search producers and consumers.
//!
//! Once opened the gate stays open: a consumer that arrives late checks the
//! flag under the lock and passes straight through instead of waiting for a
//! notification that already fired.
use std::sync::{Condvar, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct StartGate {
    ready: Mutex<bool>,
    cond: Condvar,
}

impl StartGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate and wake every waiter. Idempotent.
    pub fn open(&self) {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        if !*ready {
            *ready = true;
            self.cond.notify_all();
        }
    }

    pub fn is_open(&self) -> bool {
        *self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the gate is open.
    pub fn wait(&self) {
        let guard = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        let _open = self
            .cond
            .wait_while(guard, |ready| !*ready)
            .unwrap_or_else(PoisonError::into_inner);
    }
}
