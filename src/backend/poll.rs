//! Portable fallback backend built on `poll(2)`. Used on platforms with
//! neither epoll nor kqueue, or when a caller explicitly requests it.
//!
//! `poll` has no persistent kernel-side registration, so this backend just
//! keeps its own `Vec<pollfd>` and rebuilds it on every `add`/`remove`.
//! That makes registration O(n) rather than epoll's O(1), which is the
//! trade a portable fallback makes.

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use crate::backend::{Backend, EventSink};
use crate::direction::Direction;
use crate::error::Result;
use crate::macros::syscall;
use crate::sys::selfpipe::SelfPipe;

pub struct Poll {
    wake: SelfPipe,
    fds: Vec<libc::pollfd>,
}

impl Poll {
    pub fn new() -> io::Result<Poll> {
        let wake = SelfPipe::new()?;
        let fds = vec![libc::pollfd {
            fd: wake.read_fd(),
            events: libc::POLLIN,
            revents: 0,
        }];
        Ok(Poll { wake, fds })
    }

    fn slot(&mut self, fd: RawFd) -> &mut libc::pollfd {
        if let Some(i) = self.fds.iter().position(|p| p.fd == fd) {
            &mut self.fds[i]
        } else {
            self.fds.push(libc::pollfd {
                fd,
                events: 0,
                revents: 0,
            });
            self.fds.last_mut().unwrap()
        }
    }
}

impl Backend for Poll {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn add(&mut self, fd: RawFd, dir: Direction) -> io::Result<()> {
        let bit = match dir {
            Direction::Read => libc::POLLIN,
            Direction::Write => libc::POLLOUT,
            Direction::Error => return Ok(()),
        };
        self.slot(fd).events |= bit;
        Ok(())
    }

    fn remove(&mut self, fd: RawFd, dir: Direction) -> io::Result<()> {
        let bit = match dir {
            Direction::Read => libc::POLLIN,
            Direction::Write => libc::POLLOUT,
            Direction::Error => return Ok(()),
        };
        if let Some(i) = self.fds.iter().position(|p| p.fd == fd) {
            self.fds[i].events &= !bit;
            if self.fds[i].events == 0 && self.fds[i].fd != self.wake.read_fd() {
                self.fds.remove(i);
            }
        }
        Ok(())
    }

    fn check_events(&mut self, timeout: Option<Duration>, sink: &dyn EventSink) -> Result<()> {
        for p in &mut self.fds {
            p.revents = 0;
        }

        let timeout_ms = match timeout {
            Some(d) => d.as_millis().min(i32::MAX as u128) as i32,
            None => -1,
        };

        loop {
            match syscall!(poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout_ms
            )) {
                Ok(_) => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        for p in &self.fds {
            if p.revents == 0 {
                continue;
            }
            if p.fd == self.wake.read_fd() {
                self.wake.drain();
                continue;
            }
            if p.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                sink.dispatch_error(p.fd);
            }
            if p.revents & libc::POLLIN != 0 {
                sink.dispatch_ready(Direction::Read, p.fd);
            }
            if p.revents & libc::POLLOUT != 0 {
                sink.dispatch_ready(Direction::Write, p.fd);
            }
        }

        Ok(())
    }

    fn abort(&self) -> io::Result<()> {
        crate::sys::selfpipe::wake(self.wake.write_fd());
        Ok(())
    }
}
