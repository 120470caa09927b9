//! Pull-based generators backed by a dedicated producer thread.
//!
//! A generator pairs a producer routine with a consumer that retrieves its
//! values one at a time through a blocking [`Generator::pull()`]. The
//! routine is ordinary straight-line code — no `async`, no self-referential
//! state machine — because suspension is real: the routine runs on its own
//! thread and [`Yielder::yield_value()`] genuinely blocks it until the
//! consumer side allows it to continue.
//!
//! # Example
//!
//! ```
//! use spigot::Generator;
//!
//! let mut fib = Generator::lockstep((0u64, 1u64), |y, (mut a, mut b)| {
//!     while y.yield_value(a) {
//!         let next = a + b;
//!         a = b;
//!         b = next;
//!     }
//! });
//!
//! let mut first = Vec::new();
//! while first.len() < 8 {
//!     first.push(fib.pull().unwrap().expect("fibonacci never ends"));
//! }
//! // Abandoning the sequence early: the producer observes `false` at its
//! // next yield and stops; cancel() returns once its thread is gone.
//! fib.cancel();
//!
//! assert_eq!(first, [0, 1, 1, 2, 3, 5, 8, 13]);
//! ```
//!
//! # Modes
//!
//! Every generator runs in one of two scheduling modes, fixed at
//! construction:
//!
//! - [`Mode::Lockstep`]: strict demand-driven handoff. The producer thread
//!   starts on the first pull and computes exactly one value per pull; after
//!   yielding it stays blocked until the next pull. Production side effects
//!   happen exactly when the consumer asks, and at most one value is ever in
//!   flight.
//! - [`Mode::Buffered`]: bounded look-ahead. The producer thread starts at
//!   construction and runs ahead of the consumer, queueing up to a fixed
//!   number of values ([`DEFAULT_CAPACITY`] unless configured via
//!   [`Builder::capacity()`]). A full queue blocks the producer — classic
//!   bounded-buffer backpressure — so a slow consumer stalls production
//!   instead of growing memory.
//!
//! Values arrive in yield order in both modes.
//!
//! # Single consumer
//!
//! A [`Generator`] is an owning handle: `pull` takes `&mut self` and the
//! handle is not `Clone`, so concurrent pulls on one instance cannot be
//! written. Move the generator to hand the sequence to another consumer.
//!
//! # Teardown
//!
//! [`Generator::cancel()`] — and `Drop` — marks the generator cancelled,
//! wakes a producer blocked in a yield (which then observes `false`), and
//! joins the producer thread before returning. No producer execution
//! outlives the handle. Cancellation is cooperative: it takes effect at the
//! routine's next yield, so a routine that neither yields nor returns will
//! stall teardown.

pub mod builder;
mod error;
mod handoff;
mod iter;

pub use builder::Builder;
pub use error::{SpigotError, SpigotResult};
pub use handoff::Yielder;
pub use iter::IntoIter;

use handoff::{Handoff, Pulled};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Queue capacity of a buffered generator unless overridden via
/// [`Builder::capacity()`].
pub const DEFAULT_CAPACITY: usize = 4;

/// Scheduling policy of a generator, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Strict lockstep: one value produced per pull, no look-ahead. The
    /// producer thread is spawned lazily, on the first pull.
    Lockstep,
    /// Bounded look-ahead: the producer thread is spawned at construction
    /// and may run ahead of the consumer until its queue is full. Production
    /// side effects can therefore begin before the first pull.
    Buffered,
}

/// Lifecycle of a generator instance.
///
/// `Finished` and `Cancelled` are terminal. Values queued before `Finished`
/// remain pullable; cancellation discards undelivered values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Constructed, producer thread not yet started (lockstep mode before
    /// the first pull).
    Created,
    /// The producer routine is executing.
    Running,
    /// The producer is blocked in a yield, waiting for consumer demand or
    /// queue space.
    Suspended,
    /// The producer routine returned.
    Finished,
    /// The consumer abandoned the generator.
    Cancelled,
}

/// The type-erased producer thread body, bound at construction.
pub(crate) type ProducerFn = Box<dyn FnOnce() + Send + 'static>;

/// Consumer-side owning handle to a running (or not-yet-started) producer.
///
/// Constructed via [`Generator::lockstep()`], [`Generator::buffered()`] or
/// the full-form [`Builder`]. See the [crate docs](crate) for the handoff
/// semantics.
pub struct Generator<T> {
    handoff: Arc<Handoff<T>>,
    mode: Mode,
    /// Lockstep: the bound thread body, waiting for the first pull.
    pending: Option<ProducerFn>,
    thread: Option<JoinHandle<()>>,
    exhausted: bool,
    /// Lockstep: a pull attempt granted a permit that no value has answered
    /// yet. Keeps timed-out retries from authorizing extra steps.
    permit_outstanding: bool,
}

impl<T: Send + 'static> Generator<T> {
    /// Constructs a lockstep generator from a producer routine and the
    /// arguments bound to it.
    ///
    /// `args` is moved into the routine when its thread starts; pass a tuple
    /// for several arguments, or `()` for none.
    pub fn lockstep<A, F>(args: A, routine: F) -> Generator<T>
    where
        A: Send + 'static,
        F: FnOnce(Yielder<T>, A) + Send + 'static,
    {
        match Builder::new(Mode::Lockstep).spawn(args, routine) {
            Ok(generator) => generator,
            // Lockstep neither validates a capacity nor spawns a thread
            // before the first pull.
            Err(_) => unreachable!(),
        }
    }

    /// Constructs a buffered generator whose producer may run up to
    /// `capacity` values ahead of the consumer.
    ///
    /// The producer thread starts immediately. Fails with
    /// [`SpigotError::InvalidCapacity`] for a zero capacity and
    /// [`SpigotError::ThreadSpawn`] if the OS refuses the thread.
    pub fn buffered<A, F>(capacity: usize, args: A, routine: F) -> SpigotResult<Generator<T>>
    where
        A: Send + 'static,
        F: FnOnce(Yielder<T>, A) + Send + 'static,
    {
        Builder::new(Mode::Buffered).capacity(capacity).spawn(args, routine)
    }
}

impl<T> Generator<T> {
    pub(crate) fn assemble(
        mode: Mode,
        handoff: Arc<Handoff<T>>,
        producer: ProducerFn,
    ) -> SpigotResult<Self> {
        match mode {
            Mode::Lockstep => Ok(Self {
                handoff,
                mode,
                pending: Some(producer),
                thread: None,
                exhausted: false,
                permit_outstanding: false,
            }),
            Mode::Buffered => {
                handoff.mark_running();
                let thread = spawn_producer(producer)?;
                Ok(Self {
                    handoff,
                    mode,
                    pending: None,
                    thread: Some(thread),
                    exhausted: false,
                    permit_outstanding: false,
                })
            }
        }
    }

    /// Retrieves the next value, blocking until the producer hands one over
    /// or finishes.
    ///
    /// Returns `Ok(None)` exactly once, when the sequence is exhausted;
    /// pulling again after that fails with
    /// [`SpigotError::UseAfterExhaustion`]. A producer panic surfaces here
    /// once as [`SpigotError::ProducerPanic`].
    pub fn pull(&mut self) -> SpigotResult<Option<T>> {
        self.pull_inner(None)
    }

    /// Like [`pull()`](Self::pull), but gives up with
    /// [`SpigotError::PullTimeout`] if no value or terminal signal arrives
    /// within `timeout`. A timeout is not terminal: the next pull may still
    /// succeed.
    pub fn pull_timeout(&mut self, timeout: Duration) -> SpigotResult<Option<T>> {
        self.pull_inner(Some(timeout))
    }

    /// Current lifecycle state. A live producer moves between `Running` and
    /// `Suspended` concurrently with the caller, so treat those two as a
    /// snapshot.
    pub fn state(&self) -> State {
        self.handoff.state()
    }

    /// The scheduling policy this generator was constructed with.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Abandons the generator: marks it cancelled, tells a producer blocked
    /// in a yield to stop, and joins the producer thread.
    ///
    /// Returns only once teardown is complete — after this call no producer
    /// execution remains. Idempotent; dropping the generator does the same.
    /// A generator that already finished is left `Finished`.
    pub fn cancel(&mut self) {
        // A lockstep generator that was never pulled has no thread yet;
        // dropping the bound routine is the whole teardown.
        self.pending = None;
        self.handoff.cancel();
        if let Some(thread) = self.thread.take() {
            // The producer exits at its next yield; panics were already
            // captured inside the thread body, so join cannot propagate one.
            let _ = thread.join();
        }
    }

    fn pull_inner(&mut self, timeout: Option<Duration>) -> SpigotResult<Option<T>> {
        if self.exhausted {
            return Err(SpigotError::UseAfterExhaustion);
        }
        self.ensure_started()?;
        match self.handoff.pull(timeout) {
            Pulled::Value(value) => {
                self.permit_outstanding = false;
                Ok(Some(value))
            }
            Pulled::Exhausted => {
                self.exhausted = true;
                Ok(None)
            }
            Pulled::Panicked(message) => {
                self.exhausted = true;
                Err(SpigotError::ProducerPanic { message })
            }
            Pulled::TimedOut => match timeout {
                Some(timeout) => Err(SpigotError::PullTimeout { timeout }),
                None => unreachable!(),
            },
        }
    }

    /// First lockstep pull spawns the producer; every later one grants a
    /// resume permit unless a timed-out pull already left one outstanding.
    /// Buffered producers started at construction and need neither.
    fn ensure_started(&mut self) -> SpigotResult<()> {
        if self.mode != Mode::Lockstep {
            return Ok(());
        }
        if let Some(producer) = self.pending.take() {
            self.handoff.mark_running();
            match spawn_producer(producer) {
                Ok(thread) => {
                    self.thread = Some(thread);
                    self.permit_outstanding = true;
                }
                Err(error) => {
                    // The routine was consumed by the failed spawn; nothing
                    // can ever be produced now.
                    self.handoff.cancel();
                    return Err(error);
                }
            }
        } else if !self.permit_outstanding {
            self.handoff.grant_permit();
            self.permit_outstanding = true;
        }
        Ok(())
    }
}

impl<T> Drop for Generator<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn spawn_producer(producer: ProducerFn) -> SpigotResult<JoinHandle<()>> {
    thread::Builder::new()
        .name("spigot-producer".to_owned())
        .spawn(producer)
        .map_err(|source| SpigotError::ThreadSpawn { source })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_lockstep_is_created_until_first_pull() {
        let mut numbers = Generator::lockstep((), |y, ()| {
            y.yield_value(1);
        });
        assert_eq!(numbers.state(), State::Created);
        assert_eq!(numbers.mode(), Mode::Lockstep);

        assert_eq!(numbers.pull().unwrap(), Some(1));
        assert!(matches!(
            numbers.state(),
            State::Running | State::Suspended
        ));
        assert_eq!(numbers.pull().unwrap(), None);
        assert_eq!(numbers.state(), State::Finished);
    }

    #[test]
    fn test_buffered_starts_at_construction() {
        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let numbers = Generator::buffered(2, flag, |y, flag| {
            flag.store(true, Ordering::SeqCst);
            y.yield_value(1);
        })
        .unwrap();

        // No pull has happened; the producer is already running.
        while !started.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        assert_eq!(numbers.mode(), Mode::Buffered);
    }

    #[test]
    fn test_drop_joins_the_producer() {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);
        let mut endless = Generator::lockstep(flag, |y, flag| {
            let mut n = 0u64;
            while y.yield_value(n) {
                n += 1;
            }
            flag.store(true, Ordering::SeqCst);
        });

        assert_eq!(endless.pull().unwrap(), Some(0));
        assert_eq!(endless.pull().unwrap(), Some(1));
        drop(endless);

        // Drop joined the thread, so the routine has already run to its end.
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut numbers = Generator::lockstep((), |y, ()| {
            let mut n = 0;
            while y.yield_value(n) {
                n += 1;
            }
        });
        assert_eq!(numbers.pull().unwrap(), Some(0));
        numbers.cancel();
        numbers.cancel();
        assert_eq!(numbers.state(), State::Cancelled);
        assert_eq!(numbers.pull().unwrap(), None);
    }

    #[test]
    fn test_cancel_before_first_pull_never_runs_routine() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let mut numbers = Generator::lockstep(flag, |y, flag| {
            flag.store(true, Ordering::SeqCst);
            y.yield_value(1);
        });

        numbers.cancel();
        assert_eq!(numbers.state(), State::Cancelled);
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(numbers.pull().unwrap(), None);
        assert!(matches!(
            numbers.pull(),
            Err(SpigotError::UseAfterExhaustion)
        ));
    }

    #[test]
    fn test_finished_generator_survives_cancel() {
        let mut numbers = Generator::lockstep((), |y, ()| {
            y.yield_value(1);
        });
        assert_eq!(numbers.pull().unwrap(), Some(1));
        assert_eq!(numbers.pull().unwrap(), None);
        numbers.cancel();
        assert_eq!(numbers.state(), State::Finished);
    }
}
