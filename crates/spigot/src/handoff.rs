//! The cross-thread handoff between a producer routine and the consumer
//! pulling from it.
//!
//! Both scheduling policies share one protocol object: a mutex-guarded
//! [`Inner`] (value queue, lifecycle state, resume permits, captured panic)
//! and two condvars — `ready`, which the consumer waits on for values or a
//! terminal signal, and `vacancy`, which the producer waits on for queue
//! space, resume permits, and cancellation. Lockstep mode is the capacity-1
//! configuration with resume permits enabled; buffered mode is the
//! capacity-C configuration where the producer only ever waits on a full
//! queue.

use crate::State;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one consumer wait on the handoff.
pub(crate) enum Pulled<T> {
    /// A value was handed over.
    Value(T),
    /// The producer reached a terminal state with nothing left to deliver.
    Exhausted,
    /// The producer routine panicked; reported exactly once.
    Panicked(String),
    /// The deadline passed first (timed pulls only).
    TimedOut,
}

pub(crate) struct Handoff<T> {
    inner: Mutex<Inner<T>>,
    /// A value landed in the queue or the state turned terminal.
    ready: Condvar,
    /// Queue space or a resume permit became available, or the consumer
    /// cancelled.
    vacancy: Condvar,
}

struct Inner<T> {
    queue: VecDeque<T>,
    capacity: usize,
    /// Lockstep only: pulls that have authorized one more production step.
    permits: usize,
    lockstep: bool,
    state: State,
    /// Captured producer panic, delivered through the next pull.
    panic: Option<String>,
}

impl<T> Inner<T> {
    fn is_terminal(&self) -> bool {
        matches!(self.state, State::Finished | State::Cancelled)
    }
}

impl<T> Handoff<T> {
    pub(crate) fn new(lockstep: bool, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                capacity,
                permits: 0,
                lockstep,
                state: State::Created,
                panic: None,
            }),
            ready: Condvar::new(),
            vacancy: Condvar::new(),
        }
    }

    pub(crate) fn state(&self) -> State {
        self.inner.lock().state
    }

    /// Flips the generator from `Created` to `Running`. Lockstep generators
    /// do this on the first pull, buffered generators at construction.
    pub(crate) fn mark_running(&self) {
        self.inner.lock().state = State::Running;
    }

    /// Consumer side: authorize one more production step (lockstep only).
    pub(crate) fn grant_permit(&self) {
        let mut inner = self.inner.lock();
        inner.permits += 1;
        self.vacancy.notify_one();
    }

    /// Consumer side: block until a value, a terminal signal, or the
    /// optional timeout.
    pub(crate) fn pull(&self, timeout: Option<Duration>) -> Pulled<T> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut inner = self.inner.lock();
        loop {
            if let Some(value) = inner.queue.pop_front() {
                // A producer blocked on a full queue can move again.
                self.vacancy.notify_one();
                return Pulled::Value(value);
            }
            if let Some(message) = inner.panic.take() {
                return Pulled::Panicked(message);
            }
            if inner.is_terminal() {
                return Pulled::Exhausted;
            }
            match deadline {
                Some(deadline) => {
                    if self.ready.wait_until(&mut inner, deadline).timed_out() {
                        return Pulled::TimedOut;
                    }
                }
                None => self.ready.wait(&mut inner),
            }
        }
    }

    /// Producer side: hand one value over, blocking per the mode policy.
    ///
    /// Returns `false` once the consumer has cancelled; the value is dropped
    /// in that case and every later call keeps returning `false`.
    pub(crate) fn deliver(&self, value: T) -> bool {
        let mut inner = self.inner.lock();
        loop {
            if inner.is_terminal() {
                return false;
            }
            if inner.queue.len() < inner.capacity {
                break;
            }
            inner.state = State::Suspended;
            self.vacancy.wait(&mut inner);
        }
        inner.state = State::Running;
        inner.queue.push_back(value);
        self.ready.notify_one();
        if inner.lockstep {
            // Stay suspended until the next pull authorizes another step.
            inner.state = State::Suspended;
            loop {
                if inner.is_terminal() {
                    return false;
                }
                if inner.permits > 0 {
                    break;
                }
                self.vacancy.wait(&mut inner);
            }
            inner.permits -= 1;
            inner.state = State::Running;
        }
        true
    }

    /// Producer epilogue: the routine returned, or panicked with `panic`.
    pub(crate) fn complete(&self, panic: Option<String>) {
        let mut inner = self.inner.lock();
        if !inner.is_terminal() {
            inner.state = State::Finished;
            inner.panic = panic;
        }
        self.ready.notify_all();
        self.vacancy.notify_all();
    }

    /// Consumer teardown: mark `Cancelled`, discard undelivered values and
    /// wake both sides. Values already pulled are unaffected.
    pub(crate) fn cancel(&self) {
        let mut inner = self.inner.lock();
        if !inner.is_terminal() {
            inner.state = State::Cancelled;
        }
        inner.queue.clear();
        self.ready.notify_all();
        self.vacancy.notify_all();
    }
}

/// Producer-side handle: the only way a routine emits values.
///
/// A `Yielder` is handed to the producer routine when its thread starts. It
/// is not `Clone`, so a generator has exactly one producer for its entire
/// lifetime.
pub struct Yielder<T> {
    handoff: Arc<Handoff<T>>,
}

impl<T> Yielder<T> {
    pub(crate) fn new(handoff: Arc<Handoff<T>>) -> Self {
        Self { handoff }
    }

    /// Hands `value` to the consumer and blocks according to the
    /// generator's mode: in lockstep mode until the next pull permits
    /// another step, in buffered mode only while the queue is full.
    ///
    /// Returns `true` while the consumer still wants values. Once the
    /// consumer has cancelled, returns `false` and drops `value`; the
    /// routine is expected to stop promptly, but continuing to call this is
    /// harmless — later values are dropped and `false` keeps coming back.
    pub fn yield_value(&self, value: T) -> bool {
        self.handoff.deliver(value)
    }
}
