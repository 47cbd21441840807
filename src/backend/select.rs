//! Last-resort backend built on `select(2)`, kept mainly for platforms or
//! sandboxes where even `poll` is unavailable. `select`'s `fd_set` has a
//! fixed capacity (`FD_SETSIZE`, conventionally 1024), so registered fds
//! are split into chunks of 256 and polled with back-to-back `select`
//! calls sharing one timeout budget, the same historical workaround the
//! original implementation used.

use std::io;
use std::mem;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use crate::backend::{Backend, EventSink};
use crate::direction::Direction;
use crate::error::Result;
use crate::macros::syscall;
use crate::sys::selfpipe::SelfPipe;

const CHUNK: usize = 256;

#[derive(Default, Copy, Clone)]
struct Interest {
    read: bool,
    write: bool,
}

pub struct Select {
    wake: SelfPipe,
    interests: Vec<(RawFd, Interest)>,
}

impl Select {
    pub fn new() -> io::Result<Select> {
        Ok(Select {
            wake: SelfPipe::new()?,
            interests: Vec::new(),
        })
    }

    fn slot(&mut self, fd: RawFd) -> &mut Interest {
        if let Some(i) = self.interests.iter().position(|(f, _)| *f == fd) {
            &mut self.interests[i].1
        } else {
            self.interests.push((fd, Interest::default()));
            &mut self.interests.last_mut().unwrap().1
        }
    }
}

impl Backend for Select {
    fn name(&self) -> &'static str {
        "select"
    }

    fn add(&mut self, fd: RawFd, dir: Direction) -> io::Result<()> {
        match dir {
            Direction::Read => self.slot(fd).read = true,
            Direction::Write => self.slot(fd).write = true,
            Direction::Error => {}
        }
        Ok(())
    }

    fn remove(&mut self, fd: RawFd, dir: Direction) -> io::Result<()> {
        if let Some(i) = self.interests.iter().position(|(f, _)| *f == fd) {
            match dir {
                Direction::Read => self.interests[i].1.read = false,
                Direction::Write => self.interests[i].1.write = false,
                Direction::Error => {}
            }
            let Interest { read, write } = self.interests[i].1;
            if !read && !write {
                self.interests.remove(i);
            }
        }
        Ok(())
    }

    fn check_events(&mut self, timeout: Option<Duration>, sink: &dyn EventSink) -> Result<()> {
        let deadline = timeout.map(|d| Instant::now() + d);

        // wake pipe always gets its own tiny select first so it is never
        // starved by chunk rotation, then the real interest list.
        let chunks: Vec<&[(RawFd, Interest)]> = if self.interests.is_empty() {
            vec![&[]]
        } else {
            self.interests.chunks(CHUNK).collect()
        };

        for chunk in chunks {
            let mut readfds: libc::fd_set = unsafe { mem::zeroed() };
            let mut writefds: libc::fd_set = unsafe { mem::zeroed() };
            let mut errorfds: libc::fd_set = unsafe { mem::zeroed() };
            unsafe {
                libc::FD_ZERO(&mut readfds);
                libc::FD_ZERO(&mut writefds);
                libc::FD_ZERO(&mut errorfds);
            }

            let mut maxfd = self.wake.read_fd();
            unsafe {
                libc::FD_SET(self.wake.read_fd(), &mut readfds);
            }
            for &(fd, interest) in chunk {
                if interest.read {
                    unsafe { libc::FD_SET(fd, &mut readfds) };
                }
                if interest.write {
                    unsafe { libc::FD_SET(fd, &mut writefds) };
                }
                unsafe { libc::FD_SET(fd, &mut errorfds) };
                maxfd = maxfd.max(fd);
            }

            let chunk_timeout = match deadline {
                Some(dl) => {
                    let remaining = dl.saturating_duration_since(Instant::now());
                    Some(remaining)
                }
                None => timeout,
            };
            let mut tv = chunk_timeout.map(|d| libc::timeval {
                tv_sec: d.as_secs() as libc::time_t,
                tv_usec: d.subsec_micros() as libc::suseconds_t,
            });
            let tv_ptr = match &mut tv {
                Some(t) => t as *mut _,
                None => std::ptr::null_mut(),
            };

            let n = loop {
                match syscall!(select(
                    maxfd + 1,
                    &mut readfds,
                    &mut writefds,
                    &mut errorfds,
                    tv_ptr
                )) {
                    Ok(n) => break n,
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            };
            if n == 0 {
                continue;
            }

            if unsafe { libc::FD_ISSET(self.wake.read_fd(), &readfds) } {
                self.wake.drain();
            }
            for &(fd, _) in chunk {
                if unsafe { libc::FD_ISSET(fd, &errorfds) } {
                    sink.dispatch_error(fd);
                }
                if unsafe { libc::FD_ISSET(fd, &readfds) } {
                    sink.dispatch_ready(Direction::Read, fd);
                }
                if unsafe { libc::FD_ISSET(fd, &writefds) } {
                    sink.dispatch_ready(Direction::Write, fd);
                }
            }
        }

        Ok(())
    }

    fn abort(&self) -> io::Result<()> {
        crate::sys::selfpipe::wake(self.wake.write_fd());
        Ok(())
    }
}
