//! Self-pipe used to bounce signal notifications out of a signal handler
//! and into the ordinary readiness-driven dispatch loop.
//!
//! The handler itself only ever does an async-signal-safe `write(2)` of a
//! single byte; everything else (bitmask bookkeeping, running user
//! callbacks) happens later on the reactor thread once the read end of the
//! pipe is reported readable like any other fd. This is the same split
//! `signal-hook`'s `low_level::pipe` module uses.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use crate::macros::syscall;
use crate::sys::fd::FileDesc;

pub struct SelfPipe {
    read: FileDesc,
    write: FileDesc,
}

impl SelfPipe {
    pub fn new() -> io::Result<SelfPipe> {
        let mut fds = [0 as RawFd; 2];

        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            syscall!(pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK | libc::O_CLOEXEC))?;
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        {
            syscall!(pipe(fds.as_mut_ptr()))?;
            for &fd in &fds {
                let flags = syscall!(fcntl(fd, libc::F_GETFL))?;
                syscall!(fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK))?;
                let fdflags = syscall!(fcntl(fd, libc::F_GETFD))?;
                syscall!(fcntl(fd, libc::F_SETFD, fdflags | libc::FD_CLOEXEC))?;
            }
        }

        Ok(SelfPipe {
            read: unsafe { FileDesc::new(fds[0]) },
            write: unsafe { FileDesc::new(fds[1]) },
        })
    }

    pub fn read_fd(&self) -> RawFd {
        self.read.as_raw_fd()
    }

    /// Raw fd of the write end, for handing to the async-signal-safe trampoline.
    pub fn write_fd(&self) -> RawFd {
        self.write.as_raw_fd()
    }

    /// Drains every byte currently sitting in the pipe. Called from the
    /// dispatch loop once the read end is reported readable; never called
    /// from signal context.
    pub fn drain(&self) {
        let mut buf = [0u8; 128];
        loop {
            match syscall!(read(
                self.read.as_raw_fd(),
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len()
            )) {
                Ok(n) if n > 0 => continue,
                _ => break,
            }
        }
    }
}

/// Writes a single arbitrary byte to `fd`. Async-signal-safe: only calls
/// `write(2)` and ignores its result, exactly as a signal handler must.
pub fn wake(fd: RawFd) {
    unsafe {
        let byte: u8 = 0;
        libc::write(fd, &byte as *const u8 as *const libc::c_void, 1);
    }
}
