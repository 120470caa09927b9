//! Streams the Fibonacci sequence out of a lockstep generator: each value is
//! computed on the producer thread exactly when the loop below asks for it.

use spigot::Generator;

fn main() {
    let fib = Generator::lockstep((0u64, 1u64), |y, (mut a, mut b)| {
        loop {
            if !y.yield_value(a) {
                return;
            }
            // Abort when we overflow
            let Some(next) = a.checked_add(b) else {
                return;
            };
            a = b;
            b = next;
        }
    });

    let mut space = "";
    for value in fib {
        print!("{space}{value}");
        space = " ";
    }
    println!();
}
