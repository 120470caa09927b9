//! Construction surface for generators.
//!
//! [`Builder`] is the full construction form: pick a [`Mode`], optionally
//! size the buffered queue, then bind the producer routine and its
//! arguments with [`Builder::spawn()`]. The shorthand constructors
//! [`Generator::lockstep()`] and [`Generator::buffered()`] cover the
//! common cases.

use crate::error::{SpigotError, SpigotResult};
use crate::handoff::{Handoff, Yielder};
use crate::{Generator, Mode, ProducerFn, DEFAULT_CAPACITY};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Configures and constructs a [`Generator`].
///
/// # Example
///
/// ```
/// use spigot::{Builder, Mode};
///
/// let mut pages = Builder::new(Mode::Buffered)
///     .capacity(2)
///     .spawn(3u32, |y, count| {
///         for page in 1..=count {
///             if !y.yield_value(page) {
///                 return;
///             }
///         }
///     })?;
///
/// assert_eq!(pages.pull()?, Some(1));
/// assert_eq!(pages.pull()?, Some(2));
/// assert_eq!(pages.pull()?, Some(3));
/// assert_eq!(pages.pull()?, None);
/// # Ok::<(), spigot::SpigotError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    mode: Mode,
    capacity: usize,
}

impl Builder {
    /// Starts a builder for the given scheduling mode.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Queue capacity for a buffered generator. Ignored in lockstep mode,
    /// where the in-flight window is always a single value.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Binds `args` and the producer routine, producing a generator.
    ///
    /// A buffered generator spawns its producer thread here; a lockstep
    /// generator defers the spawn to the first pull. Fails with
    /// [`SpigotError::InvalidCapacity`] for a zero-capacity buffered queue
    /// and [`SpigotError::ThreadSpawn`] if the OS refuses the thread.
    pub fn spawn<T, A, F>(self, args: A, routine: F) -> SpigotResult<Generator<T>>
    where
        T: Send + 'static,
        A: Send + 'static,
        F: FnOnce(Yielder<T>, A) + Send + 'static,
    {
        let capacity = match self.mode {
            Mode::Lockstep => 1,
            Mode::Buffered => self.capacity,
        };
        if self.mode == Mode::Buffered && capacity == 0 {
            return Err(SpigotError::InvalidCapacity {
                requested: capacity,
            });
        }

        let handoff = Arc::new(Handoff::new(self.mode == Mode::Lockstep, capacity));
        let worker = Arc::clone(&handoff);
        let body: ProducerFn = Box::new(move || {
            let yielder = Yielder::new(Arc::clone(&worker));
            let outcome = catch_unwind(AssertUnwindSafe(move || routine(yielder, args)));
            worker.complete(outcome.err().map(|payload| panic_text(payload.as_ref())));
        });
        Generator::assemble(self.mode, handoff, body)
    }
}

/// Renders a panic payload for [`SpigotError::ProducerPanic`]. Payloads
/// from `panic!` are `&str` or `String`; anything else gets a placeholder.
fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = Builder::new(Mode::Buffered)
            .capacity(0)
            .spawn::<u32, _, _>((), |_, ()| {});
        assert!(matches!(
            result,
            Err(SpigotError::InvalidCapacity { requested: 0 })
        ));
    }

    #[test]
    fn test_lockstep_ignores_capacity() {
        let mut numbers = Builder::new(Mode::Lockstep)
            .capacity(0)
            .spawn((), |y, ()| {
                y.yield_value(5);
            })
            .unwrap();
        assert_eq!(numbers.pull().unwrap(), Some(5));
        assert_eq!(numbers.pull().unwrap(), None);
    }

    #[test]
    fn test_default_capacity_applies() {
        let builder = Builder::new(Mode::Buffered);
        let mut numbers = builder
            .spawn((), |y, ()| {
                for n in 0..10 {
                    if !y.yield_value(n) {
                        return;
                    }
                }
            })
            .unwrap();
        for expected in 0..10 {
            assert_eq!(numbers.pull().unwrap(), Some(expected));
        }
        assert_eq!(numbers.pull().unwrap(), None);
    }

    #[test]
    fn test_args_are_moved_into_the_routine() {
        let words = vec!["sub".to_owned(), "dub".to_owned()];
        let mut echo = Builder::new(Mode::Lockstep)
            .spawn(words, |y, words| {
                for word in words {
                    if !y.yield_value(word) {
                        return;
                    }
                }
            })
            .unwrap();
        assert_eq!(echo.pull().unwrap().as_deref(), Some("sub"));
        assert_eq!(echo.pull().unwrap().as_deref(), Some("dub"));
        assert_eq!(echo.pull().unwrap(), None);
    }
}
