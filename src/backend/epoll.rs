//! Linux backend built directly on `epoll_create1`/`epoll_ctl`/`epoll_wait`,
//! ported from this crate's own `sys::epoll` generation with `Token`/`Ready`
//! replaced by the reactor's plain `Direction` enum.

use std::collections::HashMap;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use crate::backend::{Backend, EventSink};
use crate::direction::Direction;
use crate::error::Result;
use crate::macros::syscall;
use crate::sys::fd::FileDesc;
use crate::sys::selfpipe::SelfPipe;

const WAKE_TOKEN: u64 = u64::MAX;

#[derive(Default, Copy, Clone)]
struct Interest {
    read: bool,
    write: bool,
}

impl Interest {
    fn as_epoll_events(&self) -> u32 {
        let mut events = 0;
        if self.read {
            events |= libc::EPOLLIN as u32;
        }
        if self.write {
            events |= libc::EPOLLOUT as u32;
        }
        events
    }
}

pub struct Epoll {
    epfd: FileDesc,
    wake: SelfPipe,
    interests: HashMap<RawFd, Interest>,
}

impl Epoll {
    pub fn new() -> io::Result<Epoll> {
        let fd = syscall!(epoll_create1(libc::EPOLL_CLOEXEC))?;
        let epfd = unsafe { FileDesc::new(fd) };
        let wake = SelfPipe::new()?;

        let mut ev = libc::epoll_event {
            events: libc::EPOLLIN as u32,
            u64: WAKE_TOKEN,
        };
        syscall!(epoll_ctl(
            epfd.as_raw_fd(),
            libc::EPOLL_CTL_ADD,
            wake.read_fd(),
            &mut ev
        ))?;

        Ok(Epoll {
            epfd,
            wake,
            interests: HashMap::new(),
        })
    }

    fn apply(&mut self, fd: RawFd) -> io::Result<()> {
        let interest = self.interests.get(&fd).copied().unwrap_or_default();
        let had_entry = interest.read || interest.write;

        let mut ev = libc::epoll_event {
            events: interest.as_epoll_events(),
            u64: fd as u64,
        };

        let op = if !had_entry {
            libc::EPOLL_CTL_DEL
        } else {
            libc::EPOLL_CTL_MOD
        };

        match syscall!(epoll_ctl(self.epfd.as_raw_fd(), op, fd, &mut ev)) {
            Ok(_) => Ok(()),
            Err(err) if op == libc::EPOLL_CTL_DEL && err.kind() == io::ErrorKind::NotFound => {
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

impl Backend for Epoll {
    fn name(&self) -> &'static str {
        "epoll"
    }

    fn add(&mut self, fd: RawFd, dir: Direction) -> io::Result<()> {
        let entry = self.interests.entry(fd).or_default();
        let is_new = !(entry.read || entry.write);
        match dir {
            Direction::Read => entry.read = true,
            Direction::Write => entry.write = true,
            Direction::Error => return Ok(()),
        }

        if is_new {
            let mut ev = libc::epoll_event {
                events: self.interests[&fd].as_epoll_events(),
                u64: fd as u64,
            };
            syscall!(epoll_ctl(self.epfd.as_raw_fd(), libc::EPOLL_CTL_ADD, fd, &mut ev))?;
            Ok(())
        } else {
            self.apply(fd)
        }
    }

    fn remove(&mut self, fd: RawFd, dir: Direction) -> io::Result<()> {
        if let Some(entry) = self.interests.get_mut(&fd) {
            match dir {
                Direction::Read => entry.read = false,
                Direction::Write => entry.write = false,
                Direction::Error => return Ok(()),
            }
        } else {
            return Ok(());
        }

        let empty = {
            let entry = self.interests[&fd];
            !(entry.read || entry.write)
        };

        self.apply(fd)?;

        if empty {
            self.interests.remove(&fd);
        }
        Ok(())
    }

    fn check_events(&mut self, timeout: Option<Duration>, sink: &dyn EventSink) -> Result<()> {
        let mut events: [libc::epoll_event; 256] = unsafe { std::mem::zeroed() };
        let timeout_ms = match timeout {
            Some(d) => d.as_millis().min(i32::MAX as u128) as i32,
            None => -1,
        };

        let count = loop {
            match syscall!(epoll_wait(
                self.epfd.as_raw_fd(),
                events.as_mut_ptr(),
                events.len() as i32,
                timeout_ms
            )) {
                Ok(n) => break n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        for ev in &events[..count as usize] {
            if ev.u64 == WAKE_TOKEN {
                self.wake.drain();
                continue;
            }
            let fd = ev.u64 as RawFd;
            let bits = ev.events as i32;
            if bits & (libc::EPOLLERR | libc::EPOLLHUP) != 0 {
                sink.dispatch_error(fd);
            }
            if bits & libc::EPOLLIN != 0 {
                sink.dispatch_ready(Direction::Read, fd);
            }
            if bits & libc::EPOLLOUT != 0 {
                sink.dispatch_ready(Direction::Write, fd);
            }
        }

        Ok(())
    }

    fn abort(&self) -> io::Result<()> {
        crate::sys::selfpipe::wake(self.wake.write_fd());
        Ok(())
    }
}

impl Drop for Epoll {
    fn drop(&mut self) {
        let mut ev = libc::epoll_event { events: 0, u64: 0 };
        let _ = unsafe {
            libc::epoll_ctl(
                self.epfd.as_raw_fd(),
                libc::EPOLL_CTL_DEL,
                self.wake.read_fd(),
                &mut ev,
            )
        };
    }
}
