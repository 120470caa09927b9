//! A slow consumer draining a buffered generator. The producer fetches pages
//! ahead of the consumer, but never more than the queue capacity — watch the
//! timestamps: the first pulls are served instantly from the look-ahead
//! window, while the producer stalls whenever the window is full.

use spigot::{Builder, Mode};
use std::thread;
use std::time::{Duration, Instant};

fn main() {
    let started = Instant::now();
    let mut pages = Builder::new(Mode::Buffered)
        .capacity(2)
        .spawn(1u32..=6, |y, range| {
            for page in range {
                if !y.yield_value(fetch(page)) {
                    return;
                }
            }
        })
        .expect("capacity is non-zero");

    while let Some(page) = pages.pull().expect("producer does not fail") {
        println!("[{:>4}ms] {page}", started.elapsed().as_millis());
        // Slow consumer: the producer keeps fetching ahead meanwhile.
        thread::sleep(Duration::from_millis(120));
    }
}

/// Pretend network fetch.
fn fetch(page: u32) -> String {
    thread::sleep(Duration::from_millis(30));
    format!("page {page}")
}
