//! Fire-and-forget buffered writes over a writable-readiness channel
//! (spec 4.6). [`buffwrite`] chunks a payload, queues it behind a
//! dedicated [`Registry::write`]/[`Registry::error`] pair, and survives
//! partial writes; a second call for the same fd appends to the
//! already-queued writer instead of starting a new one.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::os::unix::io::RawFd;
use std::rc::Rc;

use crate::registry::Registry;

const CHUNK_SIZE: usize = 4096;

thread_local! {
    static WRITERS: RefCell<HashMap<RawFd, Rc<WriterState>>> = RefCell::new(HashMap::new());
}

struct WriterState {
    registry: Registry,
    fd: RawFd,
    chunks: RefCell<VecDeque<Vec<u8>>>,
    sender: RefCell<Box<dyn FnMut(RawFd, &[u8]) -> io::Result<usize>>>,
    on_error: RefCell<Box<dyn FnMut()>>,
    write_listener: RefCell<Option<crate::listener::IoListener>>,
    error_listener: RefCell<Option<crate::listener::IoListener>>,
    errored: Cell<bool>,
    error_count: Cell<u32>,
}

impl WriterState {
    fn arm_write(self: &Rc<Self>) {
        let armed = self.write_listener.borrow().as_ref().map(|l| l.pending()).unwrap_or(false);
        if armed {
            return;
        }
        let state = Rc::clone(self);
        if let Ok(listener) = self.registry.write(self.fd, false, move || state.on_writable()) {
            *self.write_listener.borrow_mut() = Some(listener);
        }
    }

    fn arm_error(self: &Rc<Self>) {
        let armed = self.error_listener.borrow().as_ref().map(|l| l.pending()).unwrap_or(false);
        if armed {
            return;
        }
        let state = Rc::clone(self);
        if let Ok(listener) = self.registry.error(self.fd, move || {
            state.fail();
            false
        }) {
            *self.error_listener.borrow_mut() = Some(listener);
        }
    }

    fn on_writable(&self) -> bool {
        if self.errored.get() {
            return false;
        }
        let chunk = match self.chunks.borrow_mut().pop_front() {
            Some(c) => c,
            None => return false,
        };

        match (self.sender.borrow_mut())(self.fd, &chunk) {
            Ok(n) if n >= chunk.len() => {}
            Ok(n) => {
                self.chunks.borrow_mut().push_front(chunk[n..].to_vec());
            }
            Err(_) => {
                self.fail();
                return false;
            }
        }

        !self.chunks.borrow().is_empty()
    }

    fn fail(&self) {
        self.chunks.borrow_mut().clear();
        if self.errored.replace(true) {
            self.error_count.set(self.error_count.get() + 1);
        } else {
            (self.on_error.borrow_mut())();
        }
    }
}

fn sys_write(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    crate::macros::syscall!(write(fd, buf.as_ptr() as *const libc::c_void, buf.len()))
        .map(|n| n as usize)
}

/// Queues `data` for delivery to `fd`, coalescing with any writer already
/// registered for that descriptor. `sender` performs the actual syscall
/// for one chunk (pass [`None`] equivalent by using [`buffwrite_fd`] for
/// the common raw-`write(2)` case); `on_error` fires once, the first time
/// `sender` or the paired error listener reports failure.
pub fn buffwrite<S, E>(registry: &Registry, fd: RawFd, data: &[u8], sender: S, on_error: E)
where
    S: FnMut(RawFd, &[u8]) -> io::Result<usize> + 'static,
    E: FnMut() + 'static,
{
    let state = WRITERS.with(|writers| {
        Rc::clone(writers.borrow_mut().entry(fd).or_insert_with(|| {
            Rc::new(WriterState {
                registry: registry.clone(),
                fd,
                chunks: RefCell::new(VecDeque::new()),
                sender: RefCell::new(Box::new(sender)),
                on_error: RefCell::new(Box::new(on_error)),
                write_listener: RefCell::new(None),
                error_listener: RefCell::new(None),
                errored: Cell::new(false),
                error_count: Cell::new(0),
            })
        }))
    });

    ingest(&state, data);
}

/// Convenience wrapper over [`buffwrite`] using a plain `write(2)` as the
/// sender, for the common case of a raw pipe or socket fd.
pub fn buffwrite_fd<E>(registry: &Registry, fd: RawFd, data: &[u8], on_error: E)
where
    E: FnMut() + 'static,
{
    buffwrite(registry, fd, data, sys_write, on_error)
}

fn ingest(state: &Rc<WriterState>, data: &[u8]) {
    if data.is_empty() {
        return;
    }
    {
        let mut chunks = state.chunks.borrow_mut();
        for chunk in data.chunks(CHUNK_SIZE) {
            chunks.push_back(chunk.to_vec());
        }
    }
    state.arm_write();
    state.arm_error();
}
