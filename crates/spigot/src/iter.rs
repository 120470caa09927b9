//! For-each integration: draining a generator as a standard iterator.

use crate::Generator;
use std::iter::FusedIterator;

/// Iterator over a generator's values, created by [`IntoIterator`].
///
/// The adapter is fused: after exhaustion it keeps returning `None` instead
/// of tripping the use-after-exhaustion guard. A producer panic resurfaces
/// as a panic here, since `Iterator` has no error channel; use
/// [`Generator::pull()`] directly to handle it as a value.
pub struct IntoIter<T> {
    generator: Generator<T>,
    done: bool,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.done {
            return None;
        }
        match self.generator.pull() {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => panic!("generator iteration failed: {error}"),
        }
    }
}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for Generator<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            generator: self,
            done: false,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::Generator;

    #[test]
    fn test_for_loop_drains_in_order() {
        let squares = Generator::lockstep(4u32, |y, limit| {
            for n in 1..=limit {
                if !y.yield_value(n * n) {
                    return;
                }
            }
        });

        let mut collected = Vec::new();
        for value in squares {
            collected.push(value);
        }
        assert_eq!(collected, [1, 4, 9, 16]);
    }

    #[test]
    fn test_iterator_is_fused() {
        let mut numbers = Generator::buffered(2, (), |y, ()| {
            y.yield_value(1);
        })
        .unwrap()
        .into_iter();

        assert_eq!(numbers.next(), Some(1));
        assert_eq!(numbers.next(), None);
        // Fused: no use-after-exhaustion panic on repeated calls.
        assert_eq!(numbers.next(), None);
    }

    #[test]
    fn test_dropping_the_iterator_cancels() {
        let squares = Generator::lockstep((), |y, ()| {
            let mut n = 0u64;
            while y.yield_value(n) {
                n += 1;
            }
        });
        let taken: Vec<_> = squares.into_iter().take(3).collect();
        assert_eq!(taken, [0, 1, 2]);
    }
}
