//! Drives real pipes and the full dispatch loop end to end (spec 8).

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::os::unix::io::{FromRawFd, RawFd};
use std::rc::Rc;
use std::time::{Duration, Instant};

use rel_reactor::Registry;

fn pipe() -> (RawFd, RawFd) {
    let mut fds = [0 as RawFd; 2];
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(rc, 0);
    unsafe {
        let flags = libc::fcntl(fds[0], libc::F_GETFL);
        libc::fcntl(fds[0], libc::F_SETFL, flags | libc::O_NONBLOCK);
        let flags = libc::fcntl(fds[1], libc::F_GETFL);
        libc::fcntl(fds[1], libc::F_SETFL, flags | libc::O_NONBLOCK);
    }
    (fds[0], fds[1])
}

// E1: a timeout fires once, close to its requested delay.
#[test]
fn timeout_fires_once_near_its_delay() {
    let reactor = Registry::new().unwrap();
    let fired = Rc::new(Cell::new(0));
    let start = Instant::now();

    {
        let fired = Rc::clone(&fired);
        let reactor2 = reactor.clone();
        reactor.timeout(Duration::from_millis(200), move || {
            fired.set(fired.get() + 1);
            reactor2.abort();
            false
        });
    }

    reactor.dispatch().unwrap();

    assert_eq!(fired.get(), 1);
    assert!(start.elapsed() < Duration::from_secs(2));
}

// E2: a byte payload written to one end of a pipe is delivered verbatim
// to the read callback registered on the other end.
#[test]
fn read_listener_delivers_exact_bytes() {
    let (r, w) = pipe();
    let reactor = Registry::new().unwrap();
    let received: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

    {
        let received = Rc::clone(&received);
        let reactor2 = reactor.clone();
        reactor
            .read(r, false, move || {
                let mut buf = [0u8; 64];
                let n = unsafe { libc::read(r, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
                if n > 0 {
                    received.borrow_mut().extend_from_slice(&buf[..n as usize]);
                }
                reactor2.abort();
                false
            })
            .unwrap();
    }

    let mut wfile = unsafe { std::fs::File::from_raw_fd(w) };
    wfile.write_all(b"hi niels").unwrap();
    std::mem::forget(wfile);

    reactor.dispatch().unwrap();

    assert_eq!(&received.borrow()[..], b"hi niels");

    unsafe {
        libc::close(r);
        libc::close(w);
    }
}

// E3: a short timeout aborts the loop before a much longer one fires.
#[test]
fn short_timeout_aborts_before_long_one_fires() {
    let reactor = Registry::new().unwrap();
    let long_fired = Rc::new(Cell::new(false));

    {
        let long_fired = Rc::clone(&long_fired);
        reactor.timeout(Duration::from_secs(5), move || {
            long_fired.set(true);
            false
        });
    }
    {
        let reactor2 = reactor.clone();
        reactor.timeout(Duration::from_millis(100), move || {
            reactor2.abort();
            false
        });
    }

    reactor.dispatch().unwrap();

    assert!(!long_fired.get());
}

// A persistent read listener survives several callbacks, one per write.
#[test]
fn persistent_read_listener_survives_multiple_firings() {
    let (r, w) = pipe();
    let reactor = Registry::new().unwrap();
    let count = Rc::new(Cell::new(0));

    {
        let count = Rc::clone(&count);
        let reactor2 = reactor.clone();
        reactor
            .read(r, true, move || {
                let mut buf = [0u8; 8];
                let n = unsafe {
                    libc::read(r, buf.as_mut_ptr() as *mut libc::c_void, buf.len())
                };
                if n > 0 {
                    count.set(count.get() + 1);
                }
                if count.get() >= 3 {
                    reactor2.abort();
                }
                true
            })
            .unwrap();
    }

    for _ in 0..3 {
        unsafe {
            libc::write(w, b"x".as_ptr() as *const libc::c_void, 1);
        }
    }

    reactor.dispatch().unwrap();

    assert_eq!(count.get(), 3);

    unsafe {
        libc::close(r);
        libc::close(w);
    }
}

// E5: a panicking callback propagates out of `dispatch()` rather than
// being swallowed, distinguishing a real bug from `abort_branch`.
#[test]
fn panicking_callback_propagates_out_of_dispatch() {
    let reactor = Registry::new().unwrap();
    reactor.timeout(Duration::from_millis(10), || panic!("boom"));

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| reactor.dispatch()));
    assert!(result.is_err());
}

// abort_branch unwinds only the callback that raised it; a sibling timer
// still fires in the same run.
#[test]
fn abort_branch_does_not_stop_sibling_listeners() {
    let reactor = Registry::new().unwrap();
    let sibling_fired = Rc::new(Cell::new(false));

    reactor.timeout(Duration::from_millis(10), || {
        rel_reactor::abort_branch();
    });
    {
        let sibling_fired = Rc::clone(&sibling_fired);
        let reactor2 = reactor.clone();
        reactor.timeout(Duration::from_millis(20), move || {
            sibling_fired.set(true);
            reactor2.abort();
            false
        });
    }

    reactor.dispatch().unwrap();

    assert!(sibling_fired.get());
}

// E6: the buffered writer delivers a payload larger than one chunk even
// when the peer only accepts a few bytes per readiness.
#[test]
fn buffered_writer_delivers_full_payload_over_partial_accepts() {
    let (r, w) = pipe();
    let reactor = Registry::new().unwrap();
    let payload = vec![7u8; 8192];

    rel_reactor::buffwriter::buffwrite_fd(&reactor, w, &payload, || panic!("unexpected send failure"));

    let received: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let received = Rc::clone(&received);
        let reactor2 = reactor.clone();
        reactor
            .read(r, true, move || {
                let mut buf = [0u8; 10];
                let n = unsafe { libc::read(r, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
                if n > 0 {
                    received.borrow_mut().extend_from_slice(&buf[..n as usize]);
                }
                if received.borrow().len() >= 8192 {
                    reactor2.abort();
                    return false;
                }
                true
            })
            .unwrap();
    }

    reactor.dispatch().unwrap();

    assert_eq!(received.borrow().len(), 8192);
    assert!(received.borrow().iter().all(|&b| b == 7));

    unsafe {
        libc::close(r);
        libc::close(w);
    }
}

// E4-shaped: a compound event watching a pipe's read side fires with the
// READ bit set and carries the handle fd through to the callback.
#[test]
fn compound_event_fires_on_read_with_matching_evtype() {
    use rel_reactor::{CompoundListener, EventHandle, EV_READ};

    let (r, w) = pipe();
    let reactor = Registry::new().unwrap();
    let seen_mask = Rc::new(Cell::new(0u32));

    let event: CompoundListener = {
        let seen_mask = Rc::clone(&seen_mask);
        let reactor2 = reactor.clone();
        reactor.event(
            move |mask| {
                seen_mask.set(mask);
                reactor2.abort();
                false
            },
            EV_READ,
            EventHandle::Fd(r),
        )
    };
    event.add(None);
    assert!(event.pending());

    unsafe {
        libc::write(w, b"x".as_ptr() as *const libc::c_void, 1);
    }

    reactor.dispatch().unwrap();

    assert_eq!(seen_mask.get(), EV_READ);

    unsafe {
        libc::close(r);
        libc::close(w);
    }
}

// A compound event with only EV_TIMEOUT set ignores its handle entirely
// and fires purely off the inner timer child.
#[test]
fn compound_event_timeout_only_fires_without_io() {
    use rel_reactor::{EventHandle, EV_TIMEOUT};

    let reactor = Registry::new().unwrap();
    let fired = Rc::new(Cell::new(false));

    let event = {
        let fired = Rc::clone(&fired);
        let reactor2 = reactor.clone();
        reactor.event(
            move |mask| {
                fired.set(mask == EV_TIMEOUT);
                reactor2.abort();
                false
            },
            EV_TIMEOUT,
            EventHandle::Fd(-1),
        )
    };
    event.add(Some(Duration::from_millis(50)));

    reactor.dispatch().unwrap();

    assert!(fired.get());
    assert!(!event.pending());
}
