//! BSD/macOS backend built on `kqueue(2)`/`kevent(2)`, grounded on mio's
//! kqueue selector. Unlike epoll, kqueue tracks read and write interest as
//! independent filters, so `add`/`remove` map directly onto one `kevent`
//! call each instead of needing a read-modify-write interest mask.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::ptr;
use std::time::Duration;

use crate::backend::{Backend, EventSink};
use crate::direction::Direction;
use crate::error::Result;
use crate::macros::syscall;
use crate::sys::fd::FileDesc;
use crate::sys::selfpipe::SelfPipe;

fn filter_for(dir: Direction) -> Option<i16> {
    match dir {
        Direction::Read => Some(libc::EVFILT_READ),
        Direction::Write => Some(libc::EVFILT_WRITE),
        Direction::Error => None,
    }
}

fn kevent(ident: usize, filter: i16, flags: u16) -> libc::kevent {
    libc::kevent {
        ident: ident as libc::uintptr_t,
        filter,
        flags,
        fflags: 0,
        data: 0,
        udata: ptr::null_mut(),
    }
}

pub struct Kqueue {
    kq: FileDesc,
    wake: SelfPipe,
}

impl Kqueue {
    pub fn new() -> io::Result<Kqueue> {
        let fd = syscall!(kqueue())?;
        let kq = unsafe { FileDesc::new(fd) };
        let wake = SelfPipe::new()?;

        let changes = [kevent(
            wake.read_fd() as usize,
            libc::EVFILT_READ,
            libc::EV_ADD | libc::EV_RECEIPT,
        )];
        submit(kq.as_raw_fd(), &changes)?;

        Ok(Kqueue { kq, wake })
    }
}

fn submit(kq: RawFd, changes: &[libc::kevent]) -> io::Result<()> {
    syscall!(kevent(
        kq,
        changes.as_ptr(),
        changes.len() as i32,
        ptr::null_mut(),
        0,
        ptr::null()
    ))?;
    Ok(())
}

impl Backend for Kqueue {
    fn name(&self) -> &'static str {
        "kqueue"
    }

    fn add(&mut self, fd: RawFd, dir: Direction) -> io::Result<()> {
        let Some(filter) = filter_for(dir) else {
            return Ok(());
        };
        submit(
            self.kq.as_raw_fd(),
            &[kevent(fd as usize, filter, libc::EV_ADD | libc::EV_RECEIPT)],
        )
    }

    fn remove(&mut self, fd: RawFd, dir: Direction) -> io::Result<()> {
        let Some(filter) = filter_for(dir) else {
            return Ok(());
        };
        match submit(
            self.kq.as_raw_fd(),
            &[kevent(fd as usize, filter, libc::EV_DELETE | libc::EV_RECEIPT)],
        ) {
            Ok(()) => Ok(()),
            // the fd may already have been closed by the caller, which
            // implicitly drops kqueue's interest in it.
            Err(ref e) if e.raw_os_error() == Some(libc::ENOENT) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn check_events(&mut self, timeout: Option<Duration>, sink: &dyn EventSink) -> Result<()> {
        let mut events: [libc::kevent; 256] = unsafe { std::mem::zeroed() };

        let ts = timeout.map(|d| libc::timespec {
            tv_sec: d.as_secs() as libc::time_t,
            tv_nsec: d.subsec_nanos() as libc::c_long,
        });
        let ts_ptr = ts
            .as_ref()
            .map(|t| t as *const _)
            .unwrap_or(ptr::null());

        let count = loop {
            match syscall!(kevent(
                self.kq.as_raw_fd(),
                ptr::null(),
                0,
                events.as_mut_ptr(),
                events.len() as i32,
                ts_ptr
            )) {
                Ok(n) => break n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        for ev in &events[..count as usize] {
            if ev.ident as RawFd == self.wake.read_fd() {
                self.wake.drain();
                continue;
            }
            let fd = ev.ident as RawFd;
            if ev.flags & libc::EV_ERROR != 0 || ev.flags & libc::EV_EOF != 0 {
                sink.dispatch_error(fd);
                continue;
            }
            match ev.filter {
                libc::EVFILT_READ => sink.dispatch_ready(Direction::Read, fd),
                libc::EVFILT_WRITE => sink.dispatch_ready(Direction::Write, fd),
                _ => {}
            }
        }

        Ok(())
    }

    fn abort(&self) -> io::Result<()> {
        crate::sys::selfpipe::wake(self.wake.write_fd());
        Ok(())
    }
}
