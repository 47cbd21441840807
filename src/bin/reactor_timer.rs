//! Minimal countdown demonstration exercising `timeout`/`signal`/
//! `dispatch`/`abort`. This is new code grounded in this crate's own API,
//! not a port of any external countdown tool: it takes one argument (a
//! whole number of seconds), prints a line every second, and aborts the
//! reactor cleanly on `SIGINT` or once the countdown reaches zero.

use std::env;
use std::time::Duration;

use rel_reactor::Registry;

fn main() {
    env_logger::init();

    let seconds: u64 = env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let reactor = Registry::new().expect("no reactor backend available on this platform");

    let remaining = std::rc::Rc::new(std::cell::Cell::new(seconds));

    {
        let reactor = reactor.clone();
        let remaining = remaining.clone();
        reactor.timeout(Duration::from_secs(1), move || {
            let left = remaining.get();
            if left == 0 {
                println!("done");
                reactor.abort();
                return false;
            }
            println!("{left}...");
            remaining.set(left - 1);
            true
        });
    }

    {
        let reactor = reactor.clone();
        reactor
            .signal(libc::SIGINT, move || {
                println!("interrupted");
                reactor.abort();
            })
            .expect("failed to install SIGINT handler");
    }

    reactor.dispatch().expect("reactor dispatch failed");
}
