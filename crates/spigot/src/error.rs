//! Error types and result alias for generator construction and consumption.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// The result type used by fallible generator operations.
pub type SpigotResult<T> = Result<T, SpigotError>;

/// Errors surfaced by generator construction and by the pull side.
///
/// Cancellation is deliberately absent: abandoning a generator is a normal
/// terminal condition, not a failure.
#[derive(Error, Debug)]
pub enum SpigotError {
    /// A buffered generator was configured with a zero-slot queue.
    #[error("buffer capacity must be at least 1 (requested {requested})")]
    InvalidCapacity {
        /// The rejected capacity.
        requested: usize,
    },

    /// `pull` was called again after exhaustion had already been reported.
    #[error("pull called after the generator reported exhaustion")]
    UseAfterExhaustion,

    /// The producer routine panicked. Reported once, out of the pull that
    /// would have received the next value; the generator is finished.
    #[error("producer routine panicked: {message}")]
    ProducerPanic {
        /// The panic payload, stringified.
        message: String,
    },

    /// `pull_timeout` gave up before a value or a terminal signal arrived.
    /// Not terminal: the next pull may still succeed.
    #[error("no value arrived within {timeout:?}")]
    PullTimeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The operating system refused to spawn the producer thread.
    #[error("failed to spawn producer thread")]
    ThreadSpawn {
        /// The underlying spawn failure.
        #[source]
        source: io::Error,
    },
}
